use serde::{Deserialize, Serialize};

/// Test-name abbreviations the practice's panels usually carry. The list
/// biases naming only; a test that matches none of these keeps its own
/// name upper-cased.
pub const CANONICAL_TESTS: &[&str] = &[
    "FBS",
    "PPBS",
    "RBS",
    "HBA1C",
    "TSH",
    "T3",
    "T4",
    "FT3",
    "FT4",
    "LH",
    "FSH",
    "PROLACTIN",
    "TESTOSTERONE",
    "CORTISOL",
    "PTH",
    "VITAMIN D",
    "VITAMIN B12",
    "CALCIUM",
    "PHOSPHORUS",
    "CREATININE",
    "UREA",
    "URIC ACID",
    "SGOT",
    "SGPT",
    "HDL",
    "LDL",
    "TRIGLYCERIDES",
];

/// Map a raw test name onto the canonical list (case-insensitive) or
/// return it trimmed and upper-cased.
pub fn canonical_test_name(raw: &str) -> String {
    let trimmed = raw.trim();
    for canonical in CANONICAL_TESTS {
        if canonical.eq_ignore_ascii_case(trimmed) {
            return (*canonical).to_string();
        }
    }
    trimmed.to_uppercase()
}

/// One normalized test-result row for a single document/visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    /// DD-MM-YYYY
    pub date: String,
    pub test_name: String,
    pub value: String,
    /// Unit, normal range, interpretation. Free text; may be empty.
    pub comment: String,
}

impl TestRecord {
    pub fn to_csv_row(&self) -> String {
        [
            self.date.as_str(),
            self.test_name.as_str(),
            self.value.as_str(),
            self.comment.as_str(),
        ]
        .iter()
        .map(|field| csv_field(field))
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Quote a CSV field when it contains a comma, quote, or newline.
pub fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Render an ordered record sequence as headerless CSV text.
pub fn records_to_csv(records: &[TestRecord]) -> String {
    let mut csv = records
        .iter()
        .map(TestRecord::to_csv_row)
        .collect::<Vec<_>>()
        .join("\n");
    if !csv.is_empty() {
        csv.push('\n');
    }
    csv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_list_has_27_entries() {
        assert_eq!(CANONICAL_TESTS.len(), 27);
    }

    #[test]
    fn canonical_match_is_case_insensitive() {
        assert_eq!(canonical_test_name("hba1c"), "HBA1C");
        assert_eq!(canonical_test_name("  Tsh "), "TSH");
        assert_eq!(canonical_test_name("vitamin d"), "VITAMIN D");
    }

    #[test]
    fn unknown_name_is_uppercased_verbatim() {
        assert_eq!(canonical_test_name("Serum Amylase"), "SERUM AMYLASE");
    }

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_field("95 mg/dL"), "95 mg/dL");
    }

    #[test]
    fn comma_fields_are_quoted() {
        assert_eq!(csv_field("Normal, within range"), "\"Normal, within range\"");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(csv_field("so-called \"high\""), "\"so-called \"\"high\"\"\"");
    }

    #[test]
    fn csv_rendering_round_trips_structure() {
        let records = vec![
            TestRecord {
                date: "01-01-2024".into(),
                test_name: "HBA1C".into(),
                value: "6.5".into(),
                comment: "Normal, within range".into(),
            },
            TestRecord {
                date: "01-01-2024".into(),
                test_name: "FBS".into(),
                value: "95".into(),
                comment: "mg/dL Normal".into(),
            },
        ];
        let csv = records_to_csv(&records);
        assert_eq!(
            csv,
            "01-01-2024,HBA1C,6.5,\"Normal, within range\"\n01-01-2024,FBS,95,mg/dL Normal\n"
        );
    }

    #[test]
    fn empty_records_render_empty() {
        assert_eq!(records_to_csv(&[]), "");
    }
}
