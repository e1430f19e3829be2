//! Clock abstraction
//!
//! Clock-driven components (the basic throttle, cookie expiry) read time
//! through [`Clock`] so tests can move time forward without sleeping.
//!
//! ```
//! use std::time::Duration;
//!
//! use folio_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync {
    /// Monotonic timestamp for measuring durations
    fn now(&self) -> Instant;

    /// Current wall-clock time
    fn system_time(&self) -> SystemTime;

    /// Wall-clock time as a UTC `DateTime`
    fn utc_now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.system_time())
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually advanced clock for deterministic tests
///
/// Clones share the same elapsed counter, so a clone handed to a component
/// under test moves together with the one held by the test.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
    base_system_time: SystemTime,
}

impl MockClock {
    /// Create a mock clock anchored at the current real time
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// Create a mock clock whose wall-clock reading starts at `base`
    pub fn starting_at(base: SystemTime) -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            base_system_time: base,
        }
    }

    /// Simulate `duration` passing
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Set the absolute simulated elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Simulated time since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for time::clock.
    use std::time::UNIX_EPOCH;

    use super::*;

    /// Validates the system clock scenario.
    ///
    /// Assertions:
    /// - Ensures `now2 >= now1` evaluates to true.
    /// - Ensures the UTC reading is after 2020.
    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now1 = clock.now();
        let now2 = clock.now();

        assert!(now2 >= now1);
        assert!(clock.utc_now().timestamp() > 1_577_836_800);
    }

    /// Validates `MockClock::advance` moves both monotonic and wall time.
    ///
    /// Assertions:
    /// - Confirms the monotonic delta equals the advanced duration.
    /// - Confirms the wall-clock delta equals the advanced duration.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let start = clock.now();
        let start_wall = clock.system_time();

        clock.advance(Duration::from_secs(5));

        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
        assert_eq!(
            clock.system_time().duration_since(start_wall).unwrap(),
            Duration::from_secs(5)
        );
    }

    /// Validates that clones share elapsed state.
    ///
    /// Assertions:
    /// - Confirms a clone observes `set_elapsed` on the original.
    #[test]
    fn test_mock_clock_clones_share_state() {
        let clock = MockClock::new();
        let observer = clock.clone();

        clock.set_elapsed(Duration::from_secs(100));

        assert_eq!(observer.elapsed(), Duration::from_secs(100));
    }

    /// Validates `MockClock::starting_at` anchors wall time.
    ///
    /// Assertions:
    /// - Confirms `utc_now` reflects the anchor plus elapsed.
    #[test]
    fn test_mock_clock_starting_at() {
        let clock = MockClock::starting_at(UNIX_EPOCH + Duration::from_secs(1_000));
        clock.advance(Duration::from_millis(250));

        assert_eq!(clock.utc_now().timestamp_millis(), 1_000_250);
    }
}
