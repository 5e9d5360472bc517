//! Input validation failures

use thiserror::Error;

/// Rejected user input, reported back as-is (HTTP 400)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Empty { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Well-formedness failure, e.g. an image that is not an http(s) URL
    #[error("{field}: {reason}")]
    InvalidFormat { field: &'static str, reason: &'static str },

    #[error("unsupported {field} '{value}'")]
    InvalidVariant { field: &'static str, value: String },
}

/// Length in characters, so limits match what users type.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}
