use crate::models::document::{Document, MediaType};

use super::sanitize::sanitize_extracted_text;
use super::types::{DocumentText, TextExtractor};
use super::ExtractionError;

/// Text extractor for uploaded report files.
///
/// Digital PDFs are read page by page through their embedded text layer.
/// A scanned PDF with no text layer yields empty text, which the caller
/// treats as the no-data path rather than an error. Image uploads are a
/// placeholder capability: extraction for them is not implemented, and
/// that is surfaced as an explicit error instead of fabricated content.
pub struct ReportTextExtractor;

impl TextExtractor for ReportTextExtractor {
    fn extract(&self, document: &Document) -> Result<DocumentText, ExtractionError> {
        match document.media_type {
            MediaType::Pdf => extract_pdf_pages(document),
            MediaType::Image => Err(ExtractionError::ImageNotSupported),
            MediaType::Unknown => {
                Err(ExtractionError::UnsupportedMedia(document.file_name.clone()))
            }
        }
    }
}

fn extract_pdf_pages(document: &Document) -> Result<DocumentText, ExtractionError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(&document.bytes)
        .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

    let page_texts: Vec<String> = pages
        .iter()
        .map(|page| sanitize_extracted_text(page))
        .collect();
    let result = DocumentText::from_pages(document.id, &document.file_name, page_texts);

    tracing::info!(
        document_id = %document.id,
        pages = result.page_count(),
        text_length = result.text.len(),
        "PDF text extraction complete"
    );

    Ok(result)
}
