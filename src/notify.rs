//! Outbound webhook relay for derived CSVs. Optional; one deployment
//! forwards every processed report to a practice-management hook.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Http(String),

    #[error("webhook returned status {0}")]
    Status(u16),
}

/// Posts {patient, file_name, csv} as JSON. Any 2xx response counts as
/// delivered; there are no retries, delivery guarantees belong to the
/// receiver.
pub struct WebhookNotifier {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            url: url.to_string(),
            client,
        }
    }

    pub fn send_report(
        &self,
        patient_name: &str,
        file_name: &str,
        csv: &str,
    ) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "patient": patient_name,
            "file_name": file_name,
            "csv": csv,
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| NotifyError::Http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(url = %self.url, file = %file_name, "report relayed to webhook");
            Ok(())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}
