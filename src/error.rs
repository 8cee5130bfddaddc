use std::io;
use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("token {index} violates the input contract: {reason}")]
    InputContractViolation { index: usize, reason: String },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,
}

impl ParseError {
    pub(crate) fn contract(index: usize, reason: impl Into<String>) -> Self {
        Self::InputContractViolation {
            index,
            reason: reason.into(),
        }
    }
}
