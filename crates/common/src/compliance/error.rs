//! Preference store errors

use std::time::Duration;

use thiserror::Error;

use super::consent::ConsentDecision;
use crate::error::{ErrorClassification, ErrorSeverity};
use crate::storage::StorageError;

/// Result type for preference operations
pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Errors raised by [`crate::compliance::PreferenceStore`]
#[derive(Debug, Error)]
pub enum PreferenceError {
    /// A different consent decision is already on record
    #[error("Consent already {current}, cannot change to {requested}")]
    ConsentAlreadyDecided { current: ConsentDecision, requested: ConsentDecision },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl ErrorClassification for PreferenceError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConsentAlreadyDecided { .. } => ErrorSeverity::Warning,
            Self::Storage(err) => err.severity(),
            Self::Serialization(_) => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Storage(err) => err.is_critical(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
