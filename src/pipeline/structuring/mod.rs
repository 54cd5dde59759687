pub mod client;
pub mod parser;
pub mod prompt;
pub mod types;
pub mod validation;

pub use client::*;
pub use parser::*;
pub use prompt::*;
pub use types::*;
pub use validation::*;

use thiserror::Error;

/// Errors from the prompt → model → normalize stages.
#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("could not reach the extraction API at {0}")]
    Connection(String),

    #[error("extraction API call timed out after {0}s")]
    Timeout(u64),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("extraction API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed extraction API response: {0}")]
    ResponseParsing(String),

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("report text too large for one extraction request ({chars} chars, limit {limit})")]
    InputTooLarge { chars: usize, limit: usize },

    #[error("malformed extraction output at row {row}: {reason}")]
    MalformedOutput { row: usize, reason: String },
}

impl StructuringError {
    /// Transient failures are worth retrying with backoff. Everything
    /// else (auth, malformed request, content policy, bad output) fails
    /// fast.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) | Self::Http(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
