//! Timing control and clock abstractions
//!
//! - **[`clock`]**: [`Clock`] with real and mock implementations
//! - **[`debounce`]**: [`Debounce`] and [`AdvancedDebounce`]
//! - **[`throttle`]**: [`Throttle`] and [`AdvancedThrottle`]
//!
//! Wrappers take a callback of one argument; bundle several values into a
//! tuple. Zero durations are rejected at construction.
//!
//! ## Usage
//!
//! ```rust
//! # #[cfg(feature = "runtime")]
//! # {
//! use std::time::Duration;
//!
//! use folio_common::time::{AdvancedThrottle, ThrottleOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let on_scroll = AdvancedThrottle::new(
//!         Duration::from_millis(10),
//!         ThrottleOptions::default(),
//!         |offset: f64| println!("scrolled to {offset}"),
//!     )
//!     .unwrap();
//!
//!     on_scroll.call(120.0);
//!     on_scroll.cancel();
//! }
//! # }
//! ```

pub mod clock;
#[cfg(feature = "runtime")]
pub mod debounce;
pub mod error;
pub mod throttle;

use std::sync::Arc;
use std::time::Duration;

pub use clock::{Clock, MockClock, SystemClock};
#[cfg(feature = "runtime")]
pub use debounce::{AdvancedDebounce, Debounce, DebounceOptions};
pub use error::{TimingError, TimingResult};
pub use throttle::Throttle;
#[cfg(feature = "runtime")]
pub use throttle::{AdvancedThrottle, ThrottleOptions};

/// Shared callback invoked by the wrappers
pub(crate) type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`, for log fields
pub fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Handle of the runtime the caller is running on
#[cfg(feature = "runtime")]
pub(crate) fn current_runtime() -> TimingResult<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current().map_err(|_| TimingError::NoRuntime)
}
