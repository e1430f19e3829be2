//! Testing utilities and helpers
//!
//! - **[`mocks`]**: recording and failing implementations of the crate's
//!   seams ([`RecordingReloader`], [`FailingStore`], [`CallRecorder`])
//! - Clock abstractions re-exported from [`crate::time`]
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use std::time::Duration;
//!
//! use folio_common::testing::MockClock;
//!
//! let clock = MockClock::new();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.elapsed(), Duration::from_secs(5));
//! # }
//! ```

pub mod mocks;

#[cfg(feature = "runtime")]
pub use mocks::CallRecorder;
pub use mocks::FailingStore;
#[cfg(feature = "observability")]
pub use mocks::RecordingReloader;

pub use crate::time::{Clock, MockClock, SystemClock};
