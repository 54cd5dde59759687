pub mod pdf;
pub mod sanitize;
pub mod types;

pub use pdf::*;
pub use sanitize::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("text extraction for image uploads is not implemented")]
    ImageNotSupported,

    #[error("unsupported media type for: {0}")]
    UnsupportedMedia(String),
}
