//! Storage error types
//!
//! Errors for the fast (local) and durable (cookie) storage tiers,
//! integrated with the common error system.

use std::time::Duration;

use thiserror::Error;

use crate::error::{CommonError, ErrorClassification, ErrorSeverity};

/// Storage error type
#[derive(Debug, Error)]
pub enum StorageError {
    /// Writing `key` would push the store past its byte quota
    #[error("Storage quota exceeded writing '{key}': {attempted} bytes over a {limit} byte limit")]
    QuotaExceeded { key: String, limit: usize, attempted: usize },

    /// A single durable entry is larger than the per-entry limit
    #[error("Entry '{key}' is {size} bytes, limit is {limit}")]
    EntryTooLarge { key: String, size: usize, limit: usize },

    /// Key is empty or contains characters the tier cannot store
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    /// The tier is switched off or otherwise unusable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Stored bytes could not be decoded
    #[error("Corrupt value for '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// Backing file I/O or encoding failure
    #[error(transparent)]
    Common(#[from] CommonError),
}

/// Storage result type
pub type StorageResult<T> = Result<T, StorageError>;

impl ErrorClassification for StorageError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Common(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::QuotaExceeded { .. } | Self::EntryTooLarge { .. } => ErrorSeverity::Warning,
            Self::Unavailable(_) => ErrorSeverity::Warning,
            Self::Corrupt { .. } => ErrorSeverity::Error,
            Self::Common(err) => err.severity(),
            _ => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Common(err) => err.is_critical(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for storage::error.
    use super::*;

    /// Validates quota errors are non-retryable warnings.
    ///
    /// Assertions:
    /// - Ensures `is_retryable` is false.
    /// - Confirms severity is `Warning`.
    #[test]
    fn test_quota_classification() {
        let err = StorageError::QuotaExceeded { key: "theme".into(), limit: 10, attempted: 12 };
        assert!(!err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert!(err.to_string().contains("theme"));
    }

    /// Validates file failures surface through the common error.
    ///
    /// Assertions:
    /// - Confirms the failed operation is named in the message.
    /// - Ensures the error is not retried.
    #[test]
    fn test_persistence_failure() {
        let err = StorageError::from(CommonError::persistence_op("rename", "read-only"));
        assert_eq!(err.to_string(), "Persistence error during 'rename': read-only");
        assert!(!err.is_retryable());
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }
}
