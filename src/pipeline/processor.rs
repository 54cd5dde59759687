//! Per-document pipeline orchestration:
//! extract → prompt → model call → normalize.
//!
//! Trait-based DI for the extraction backend and the LLM client keeps
//! every stage independently testable with mock implementations.

use uuid::Uuid;

use crate::models::report::records_to_csv;
use crate::pipeline::extraction::types::TextExtractor;
use crate::pipeline::extraction::ExtractionError;
use crate::pipeline::structuring::prompt::build_extraction_request;
use crate::pipeline::structuring::types::{ExtractionOutcome, ExtractionRequest, LlmClient};
use crate::pipeline::structuring::validation::normalize_extraction_output;
use crate::pipeline::structuring::StructuringError;

use crate::models::document::Document;

/// Errors that can occur while processing one document. A failure halts
/// that document only; the submission loop continues with the rest.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("structuring failed: {0}")]
    Structuring(#[from] StructuringError),
}

/// Result of running the pipeline over one document.
#[derive(Debug, Clone)]
pub struct DocumentReport {
    pub document_id: Uuid,
    pub file_name: String,
    pub outcome: ExtractionOutcome,
}

impl DocumentReport {
    /// Headerless CSV rendering of the records; empty for a no-data
    /// outcome.
    pub fn to_csv(&self) -> String {
        records_to_csv(self.outcome.records())
    }
}

/// Model invocations per document when output fails structural
/// validation: the first call plus one re-prompt.
const MAX_OUTPUT_ATTEMPTS: usize = 2;

/// Drives the per-document stage sequence. Sequential and blocking; one
/// document at a time, no shared state across invocations.
pub struct ReportProcessor {
    extractor: Box<dyn TextExtractor + Send + Sync>,
    llm: Box<dyn LlmClient + Send + Sync>,
}

impl ReportProcessor {
    pub fn new(
        extractor: Box<dyn TextExtractor + Send + Sync>,
        llm: Box<dyn LlmClient + Send + Sync>,
    ) -> Self {
        Self { extractor, llm }
    }

    /// Run extraction → prompt → model → normalize for one document.
    ///
    /// An empty extraction (scanned report without a text layer) still
    /// goes through the model so the sentinel path applies; skipping
    /// normalization would hide the distinction between "no data" and
    /// "never looked".
    pub fn process_document(&self, document: &Document) -> Result<DocumentReport, ProcessingError> {
        let _span =
            tracing::info_span!("process_document", document_id = %document.id).entered();

        let text = self.extractor.extract(document)?;
        if text.is_empty() {
            tracing::info!(
                file = %document.file_name,
                "no extractable text; continuing so the no-data path applies"
            );
        }

        let request = build_extraction_request(&text.text)?;
        let outcome = self.complete_and_normalize(&request, &document.id)?;

        tracing::info!(
            document_id = %document.id,
            records = outcome.records().len(),
            no_data = outcome.is_no_data(),
            "document processed"
        );

        Ok(DocumentReport {
            document_id: document.id,
            file_name: document.file_name.clone(),
            outcome,
        })
    }

    /// Call the model and normalize its output, re-prompting once when
    /// the output fails structural validation. The second failure
    /// rejects the batch with the offending row.
    fn complete_and_normalize(
        &self,
        request: &ExtractionRequest,
        document_id: &Uuid,
    ) -> Result<ExtractionOutcome, StructuringError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let raw = self.llm.complete(request)?;
            match normalize_extraction_output(&raw) {
                Ok(outcome) => {
                    if attempt > 1 {
                        tracing::info!(
                            document_id = %document_id,
                            "re-prompt recovered a well-formed extraction"
                        );
                    }
                    return Ok(outcome);
                }
                Err(e) if is_output_error(&e) && attempt < MAX_OUTPUT_ATTEMPTS => {
                    tracing::warn!(
                        document_id = %document_id,
                        attempt,
                        error = %e,
                        "model output failed validation, re-prompting"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Output-shape failures are worth one fresh model call; transport and
/// input errors are not.
fn is_output_error(e: &StructuringError) -> bool {
    matches!(
        e,
        StructuringError::MalformedOutput { .. } | StructuringError::EmptyResponse
    )
}
