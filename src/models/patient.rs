use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Patient metadata captured at submission. Opaque to the pipeline;
/// passed through to persistence unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: String,
    pub contact_number: String,
    pub email: String,
    pub consultation_date: Option<NaiveDate>,
}

impl PatientDetails {
    /// Filename-safe label derived from the patient name: lower-cased
    /// ASCII alphanumerics, everything else collapsed into single dashes.
    pub fn storage_label(&self) -> String {
        let mut label = String::with_capacity(self.name.len());
        let mut prev_dash = false;
        for c in self.name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                label.push(c.to_ascii_lowercase());
                prev_dash = false;
            } else if !prev_dash {
                label.push('-');
                prev_dash = true;
            }
        }
        let trimmed = label.trim_matches('-');
        if trimmed.is_empty() {
            "patient".to_string()
        } else {
            trimmed.to_string()
        }
    }
}
