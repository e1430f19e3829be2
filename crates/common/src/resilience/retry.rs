//! Retry with exponential backoff
//!
//! One attempt plus up to `max_retries` retries, sleeping between attempts
//! with a delay that starts at `initial_delay` and is multiplied after each
//! retry. Errors classified as non-retryable end the loop immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{CommonError, ErrorClassification};
use crate::time::saturating_millis;

/// Backoff policy for [`retry_with_backoff`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Factor applied to the delay after each retry
    pub multiplier: f64,
    /// Upper bound for a single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn no_retry() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Set the retry count
    #[must_use]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the first delay
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the growth factor
    #[must_use]
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Check the policy is usable
    ///
    /// # Errors
    ///
    /// Rejects a multiplier below 1.0 or a non-finite multiplier.
    pub fn validate(&self) -> Result<(), CommonError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(CommonError::config_field(
                "retry.multiplier",
                format!("must be a finite value >= 1.0, got {}", self.multiplier),
            ));
        }
        Ok(())
    }

    /// Delay before retry number `retry` (zero-based)
    ///
    /// Always within `0..=max_delay`, even for a policy that fails
    /// [`RetryPolicy::validate`].
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        if secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Run `operation` until it succeeds, fails permanently or runs out of
/// retries, returning the last error in the latter two cases
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ErrorClassification + std::fmt::Display,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!(retries = retry, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                debug!(error = %err, "non-retryable error, giving up");
                return Err(err);
            }
            Err(err) if retry >= policy.max_retries => {
                warn!(error = %err, attempts = retry + 1, "retries exhausted");
                return Err(err);
            }
            Err(err) => {
                let delay = err.retry_after().unwrap_or_else(|| policy.delay_for(retry));
                debug!(
                    error = %err,
                    retry = retry + 1,
                    delay_ms = saturating_millis(delay),
                    "retrying"
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
        }
    }
}
