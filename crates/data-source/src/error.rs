//! Error types for the data-source crate.

use resilience::{ClassifiedError, ErrorKind, Severity};
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while loading or querying the catalog
#[derive(Error, Debug)]
pub enum DataSourceError {
    /// Dataset file could not be found or opened
    #[error("Failed to open dataset: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the dataset
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset file is not valid JSON for the expected shape
    #[error("Parse error in {file}: {reason}")]
    Parse { file: String, reason: String },

    /// A record field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Two records share the same identifier
    #[error("Duplicate entity id: {id}")]
    DuplicateEntity { id: String },

    /// Backend could not be reached or refused the call
    #[error("Data source unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer in time
    #[error("Data source timed out: {0}")]
    Timeout(String),
}

impl DataSourceError {
    fn variant_name(&self) -> &'static str {
        match self {
            DataSourceError::FileNotFound { .. } => "file_not_found",
            DataSourceError::Io(_) => "io",
            DataSourceError::Parse { .. } => "parse",
            DataSourceError::InvalidValue { .. } => "invalid_value",
            DataSourceError::DuplicateEntity { .. } => "duplicate_entity",
            DataSourceError::Unavailable(_) => "unavailable",
            DataSourceError::Timeout(_) => "timeout",
        }
    }
}

/// Backend hiccups are transient and retryable; anything that means the
/// catalog itself is wrong is an internal, non-operational fault.
impl From<DataSourceError> for ClassifiedError {
    fn from(err: DataSourceError) -> Self {
        let (kind, severity) = match &err {
            DataSourceError::Unavailable(_) | DataSourceError::Timeout(_) | DataSourceError::Io(_) => {
                (ErrorKind::TransientBackend, Severity::Medium)
            }
            DataSourceError::FileNotFound { .. }
            | DataSourceError::Parse { .. }
            | DataSourceError::InvalidValue { .. }
            | DataSourceError::DuplicateEntity { .. } => (ErrorKind::Internal, Severity::Critical),
        };
        ClassifiedError::builder(kind, err.to_string())
            .severity(severity)
            .context(json!({ "source": "data_source", "error": err.variant_name() }))
            .build()
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataSourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_are_transient() {
        let classified: ClassifiedError = DataSourceError::Timeout("candidates".into()).into();
        assert_eq!(classified.kind(), ErrorKind::TransientBackend);
        assert!(classified.is_retryable());
    }

    #[test]
    fn test_corrupt_catalog_is_internal() {
        let classified: ClassifiedError = DataSourceError::DuplicateEntity { id: "p1".into() }.into();
        assert_eq!(classified.kind(), ErrorKind::Internal);
        assert!(!classified.is_operational());
        assert!(!classified.is_retryable());
    }
}
