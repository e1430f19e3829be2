//! Resilience helpers
//!
//! - **[`retry`]**: retry with exponential backoff driven by
//!   [`ErrorClassification`](crate::error::ErrorClassification)

pub mod retry;

pub use retry::{retry_with_backoff, RetryPolicy};
