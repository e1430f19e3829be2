//! Common primitives shared across Folio crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: errors, clock, basic throttle, storage tiers
//! - `observability`: tracing, plus the consent-aware preference store
//! - `runtime`: tokio-backed debounce/throttle wrappers and retry
//! - `test-utils`: mocks for downstream tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;
#[cfg(feature = "foundation")]
pub mod storage;
#[cfg(feature = "foundation")]
pub mod time;

// Observability tier
// -----------------------------------------------------------------
#[cfg(feature = "observability")]
pub mod compliance;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "observability")]
pub use compliance::{ConsentDecision, ConsentState, PreferenceError, PreferenceStore};
#[cfg(feature = "foundation")]
pub use error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{retry_with_backoff, RetryPolicy};
#[cfg(feature = "foundation")]
pub use storage::{CookieJar, FileStore, KeyValueStore, MemoryStore, StorageError};
#[cfg(feature = "foundation")]
pub use time::{Clock, MockClock, SystemClock, Throttle, TimingError};
#[cfg(feature = "runtime")]
pub use time::{AdvancedDebounce, AdvancedThrottle, Debounce};
