//! Error types for threads-server
//!
//! Store implementations log the underlying driver failure and return a
//! [`StoreError`] carrying its message. Operations add input validation on
//! top, giving the crate-level [`Error`].

use thiserror::Error;

use crate::models::ValidationError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a store operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No connection target configured
    #[error("no database configured (set DATABASE_URL)")]
    NotConfigured,

    /// Connection could not be established or was lost
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Query failed after a connection was established
    #[error("read failed: {0}")]
    Read(String),

    /// Mutation failed
    #[error("write failed: {0}")]
    Write(String),

    /// Referenced entity does not exist
    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Whether the store itself is unreachable, as opposed to a single
    /// operation failing.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::Connectivity(_))
    }
}

/// Error returned by threads operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            Self::Store(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StoreError::not_found("thread", "abc");
        assert_eq!(err.to_string(), "not found: thread 'abc'");

        let err = StoreError::Write("Failed to create thread: boom".into());
        assert_eq!(err.to_string(), "write failed: Failed to create thread: boom");
    }

    #[test]
    fn connectivity_classification() {
        assert!(StoreError::NotConfigured.is_connectivity());
        assert!(StoreError::Connectivity("refused".into()).is_connectivity());
        assert!(!StoreError::Read("syntax".into()).is_connectivity());
    }

    #[test]
    fn validation_converts() {
        let err: Error = ValidationError::Empty { field: "text" }.into();
        assert!(err.as_store().is_none());
        assert_eq!(err.to_string(), "invalid input: text is required");
    }
}
