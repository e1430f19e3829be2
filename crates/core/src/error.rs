//! Error types used throughout the client

use std::time::Duration;

use folio_common::compliance::PreferenceError;
use folio_common::{CommonError, ErrorClassification, ErrorSeverity, StorageError, TimingError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Folio
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),

    /// A request completed with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Folio operations
pub type Result<T> = std::result::Result<T, FolioError>;

impl FolioError {
    /// Short label for structured log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Storage(_) => "storage",
            Self::Network(_) => "network",
            Self::Http { .. } => "http",
            Self::Validation(_) => "validation",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

impl ErrorClassification for FolioError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Cancelled(_) => ErrorSeverity::Info,
            Self::Network(_) | Self::Http { .. } | Self::Validation(_) => ErrorSeverity::Warning,
            Self::Config(_) | Self::Storage(_) => ErrorSeverity::Error,
            Self::Internal(_) => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl From<CommonError> for FolioError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::Config { .. } => Self::Config(err.to_string()),
            CommonError::Persistence { .. } => Self::Storage(err.to_string()),
            CommonError::Serialization { .. } => Self::Validation(err.to_string()),
        }
    }
}

impl From<StorageError> for FolioError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Common(common) => common.into(),
            other => Self::Storage(other.to_string()),
        }
    }
}

impl From<PreferenceError> for FolioError {
    fn from(err: PreferenceError) -> Self {
        match err {
            PreferenceError::Storage(storage) => storage.into(),
            PreferenceError::ConsentAlreadyDecided { .. } => Self::Validation(err.to_string()),
            PreferenceError::Serialization(serde) => Self::Validation(serde.to_string()),
        }
    }
}

impl From<TimingError> for FolioError {
    fn from(err: TimingError) -> Self {
        match err {
            TimingError::NoRuntime => Self::Internal(err.to_string()),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for FolioError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Http {
                status: status.as_u16(),
                url: err.url().map(ToString::to_string).unwrap_or_default(),
            };
        }
        if err.is_builder() {
            return Self::Config(format!("invalid request: {err}"));
        }
        if err.is_decode() {
            return Self::Validation(format!("malformed response body: {err}"));
        }
        Self::Network(err.to_string())
    }
}

impl From<url::ParseError> for FolioError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {err}"))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error.
    use super::*;

    /// Validates the serde shape matches the `type`/`message` envelope.
    ///
    /// Assertions:
    /// - Confirms tuple variants serialize their message under `message`.
    /// - Confirms the value deserializes back to the same variant.
    #[test]
    fn test_serde_envelope() {
        let err = FolioError::Cancelled("initialization cancelled at step 'theme'".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Cancelled");
        assert_eq!(json["message"], "initialization cancelled at step 'theme'");

        let back: FolioError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    /// Validates retry classification of HTTP statuses.
    ///
    /// Assertions:
    /// - Confirms 5xx and 429 are retryable.
    /// - Confirms 404 and validation errors are not.
    #[test]
    fn test_http_retry_classification() {
        let server = FolioError::Http { status: 503, url: "http://x/".into() };
        let throttled = FolioError::Http { status: 429, url: "http://x/".into() };
        let missing = FolioError::Http { status: 404, url: "http://x/".into() };

        assert!(server.is_retryable());
        assert!(throttled.is_retryable());
        assert!(!missing.is_retryable());
        assert!(!FolioError::Validation("bad".into()).is_retryable());
        assert!(FolioError::Network("reset".into()).is_retryable());
    }

    /// Validates conversions from the common crate's errors.
    ///
    /// Assertions:
    /// - Confirms consent conflicts become validation errors.
    /// - Confirms storage failures become storage errors.
    /// - Confirms a missing runtime is an internal error.
    /// - Confirms file failures keep the failed operation.
    #[test]
    fn test_conversions() {
        let consent: FolioError = PreferenceError::ConsentAlreadyDecided {
            current: folio_common::ConsentDecision::Accepted,
            requested: folio_common::ConsentDecision::Rejected,
        }
        .into();
        assert_eq!(consent.label(), "validation");

        let storage: FolioError = StorageError::Unavailable("cookie jar".into()).into();
        assert_eq!(storage.label(), "storage");

        let timing: FolioError = TimingError::NoRuntime.into();
        assert!(matches!(timing, FolioError::Internal(_)));
        assert!(timing.is_critical());

        let unwritable: FolioError =
            StorageError::from(CommonError::persistence_op("rename", "read-only")).into();
        assert_eq!(unwritable.label(), "storage");
        assert!(unwritable.to_string().contains("rename"));
    }
}
