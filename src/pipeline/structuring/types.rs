use serde::{Deserialize, Serialize};

use super::StructuringError;
use crate::models::report::TestRecord;

/// The instruction pair sent to the model. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub system: String,
    pub user: String,
}

/// Outcome of normalizing one model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    /// The report contained no interpretable data (sentinel path).
    /// Distinct from any parse failure.
    NoData,
    /// Ordered records for one document.
    Records(Vec<TestRecord>),
}

impl ExtractionOutcome {
    pub fn records(&self) -> &[TestRecord] {
        match self {
            ExtractionOutcome::NoData => &[],
            ExtractionOutcome::Records(records) => records,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ExtractionOutcome::NoData)
    }
}

/// Hosted LLM seam (allows mocking).
pub trait LlmClient {
    fn complete(&self, request: &ExtractionRequest) -> Result<String, StructuringError>;
}
