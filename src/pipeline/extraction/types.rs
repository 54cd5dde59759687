use uuid::Uuid;

use super::ExtractionError;
use crate::models::document::Document;

/// Plain text recovered from one document, page boundaries retained.
///
/// The pipeline carries one of these per uploaded document all the way
/// through normalization; nothing is flattened across documents, so
/// record attribution never becomes ambiguous in a multi-file submission.
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub document_id: Uuid,
    pub file_name: String,
    pub page_texts: Vec<String>,
    /// Pages joined with a blank line.
    pub text: String,
}

impl DocumentText {
    pub fn from_pages(document_id: Uuid, file_name: &str, page_texts: Vec<String>) -> Self {
        let text = page_texts
            .iter()
            .map(String::as_str)
            .filter(|page| !page.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Self {
            document_id,
            file_name: file_name.to_string(),
            page_texts,
            text,
        }
    }

    /// True when no extractable text was recovered, e.g. a scanned page
    /// with no text layer. A legitimate terminal state, not an error;
    /// the no-data path downstream must still run.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.page_texts.len()
    }
}

/// Text extraction seam; the processor depends on this, not on a
/// concrete backend.
pub trait TextExtractor {
    fn extract(&self, document: &Document) -> Result<DocumentText, ExtractionError>;
}
