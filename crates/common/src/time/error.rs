//! Error types for timing control wrappers

use std::time::Duration;

use thiserror::Error;

use crate::error::{ErrorClassification, ErrorSeverity};

/// Result type for timing operations
pub type TimingResult<T> = Result<T, TimingError>;

/// Errors raised while constructing debounce/throttle wrappers
#[derive(Debug, Error)]
pub enum TimingError {
    /// A wait or interval duration was zero
    #[error("Invalid duration for '{parameter}': must be greater than zero")]
    ZeroDuration { parameter: &'static str },

    /// Both leading and trailing edges disabled, the wrapper would never fire
    #[error("At least one of leading or trailing must be enabled")]
    NoEdgeEnabled,

    /// Timer-based wrappers need a tokio runtime to schedule their timers
    #[error("No tokio runtime available to schedule timers")]
    NoRuntime,
}

impl TimingError {
    /// Reject zero durations
    pub(crate) fn ensure_positive(parameter: &'static str, value: Duration) -> TimingResult<()> {
        if value.is_zero() {
            return Err(Self::ZeroDuration { parameter });
        }
        Ok(())
    }
}

impl ErrorClassification for TimingError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoRuntime => ErrorSeverity::Critical,
            Self::ZeroDuration { .. } | Self::NoEdgeEnabled => ErrorSeverity::Error,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::NoRuntime)
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
