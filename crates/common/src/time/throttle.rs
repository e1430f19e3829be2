//! Throttle wrappers
//!
//! [`Throttle`] is clock-driven and drops calls that arrive during the
//! cooldown window; it never schedules anything. [`AdvancedThrottle`] adds a
//! trailing edge that delivers the latest dropped call at the end of the
//! window, which needs a timer and therefore a tokio runtime.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::clock::{Clock, SystemClock};
use super::error::{TimingError, TimingResult};
use super::Callback;

/// Basic throttle: at most one call per `interval`, extra calls dropped
///
/// ```
/// use std::time::Duration;
///
/// use folio_common::time::{MockClock, Throttle};
///
/// let clock = MockClock::new();
/// let throttle = Throttle::with_clock(Duration::from_secs(1), clock.clone(), |n: u32| {
///     println!("scroll {n}");
/// })
/// .unwrap();
///
/// assert!(throttle.call(1));
/// assert!(!throttle.call(2));
/// clock.advance(Duration::from_secs(1));
/// assert!(throttle.call(3));
/// ```
pub struct Throttle<A, C: Clock = SystemClock> {
    callback: Callback<A>,
    interval: Duration,
    clock: C,
    last_fired: Mutex<Option<Instant>>,
}

impl<A> Throttle<A, SystemClock> {
    /// Build a throttle on the system clock
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::ZeroDuration`] for a zero `interval`.
    pub fn new<F>(interval: Duration, callback: F) -> TimingResult<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_clock(interval, SystemClock, callback)
    }
}

impl<A, C: Clock> Throttle<A, C> {
    /// Build a throttle reading time from `clock`
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::ZeroDuration`] for a zero `interval`.
    pub fn with_clock<F>(interval: Duration, clock: C, callback: F) -> TimingResult<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        TimingError::ensure_positive("interval", interval)?;
        Ok(Self { callback: Arc::new(callback), interval, clock, last_fired: Mutex::new(None) })
    }

    /// Record a call, returning whether the callback ran
    pub fn call(&self, args: A) -> bool {
        let now = self.clock.now();
        {
            let mut last_fired = self.last_fired.lock();
            let cooling =
                last_fired.is_some_and(|last| now.saturating_duration_since(last) < self.interval);
            if cooling {
                return false;
            }
            *last_fired = Some(now);
        }
        (self.callback)(args);
        true
    }

    /// Whether a call made now would be dropped
    pub fn in_cooldown(&self) -> bool {
        let now = self.clock.now();
        self.last_fired
            .lock()
            .is_some_and(|last| now.saturating_duration_since(last) < self.interval)
    }

    /// Configured cooldown
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(feature = "runtime")]
pub use advanced::{AdvancedThrottle, ThrottleOptions};

#[cfg(feature = "runtime")]
mod advanced {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::runtime::Handle;
    use tokio::task::JoinHandle;
    use tokio::time::{sleep, Instant};
    use tracing::trace;

    use crate::time::error::{TimingError, TimingResult};
    use crate::time::{current_runtime, Callback};

    /// Options for [`AdvancedThrottle`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThrottleOptions {
        /// Fire the first call of a window immediately
        pub leading: bool,
        /// Deliver the latest dropped call at the end of the window
        pub trailing: bool,
    }

    impl Default for ThrottleOptions {
        fn default() -> Self {
            Self { leading: true, trailing: true }
        }
    }

    impl ThrottleOptions {
        /// Enable or disable the leading edge
        #[must_use]
        pub fn leading(mut self, leading: bool) -> Self {
            self.leading = leading;
            self
        }

        /// Enable or disable the trailing edge
        #[must_use]
        pub fn trailing(mut self, trailing: bool) -> Self {
            self.trailing = trailing;
            self
        }
    }

    struct State<A> {
        last_args: Option<A>,
        last_invoke: Option<Instant>,
        timer: Option<JoinHandle<()>>,
        generation: u64,
    }

    struct Shared<A> {
        callback: Callback<A>,
        interval: Duration,
        options: ThrottleOptions,
        runtime: Handle,
        state: Mutex<State<A>>,
    }

    /// Throttle with leading/trailing edges and cancellation
    pub struct AdvancedThrottle<A> {
        shared: Arc<Shared<A>>,
    }

    impl<A> Clone for AdvancedThrottle<A> {
        fn clone(&self) -> Self {
            Self { shared: Arc::clone(&self.shared) }
        }
    }

    impl<A: Send + 'static> AdvancedThrottle<A> {
        /// Build an advanced throttle
        ///
        /// # Errors
        ///
        /// Returns [`TimingError::ZeroDuration`] for a zero `interval`,
        /// [`TimingError::NoEdgeEnabled`] when both edges are off, and
        /// [`TimingError::NoRuntime`] outside a tokio runtime.
        pub fn new<F>(interval: Duration, options: ThrottleOptions, callback: F) -> TimingResult<Self>
        where
            F: Fn(A) + Send + Sync + 'static,
        {
            TimingError::ensure_positive("interval", interval)?;
            if !options.leading && !options.trailing {
                return Err(TimingError::NoEdgeEnabled);
            }
            let runtime = current_runtime()?;

            Ok(Self {
                shared: Arc::new(Shared {
                    callback: Arc::new(callback),
                    interval,
                    options,
                    runtime,
                    state: Mutex::new(State {
                        last_args: None,
                        last_invoke: None,
                        timer: None,
                        generation: 0,
                    }),
                }),
            })
        }

        /// Record a call
        pub fn call(&self, args: A) {
            let shared = &self.shared;
            let time = Instant::now();
            let mut state = shared.state.lock();

            if state.last_invoke.is_none() && !shared.options.leading {
                state.last_invoke = Some(time);
            }
            let remaining = state.last_invoke.map_or(Duration::ZERO, |last| {
                shared.interval.saturating_sub(time.saturating_duration_since(last))
            });
            state.last_args = Some(args);

            let mut fire = None;
            if remaining.is_zero() {
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }
                state.generation = state.generation.wrapping_add(1);
                state.last_invoke = Some(time);
                fire = state.last_args.take();
            } else if state.timer.is_none() && shared.options.trailing {
                state.generation = state.generation.wrapping_add(1);
                let generation = state.generation;
                let task_shared = Arc::clone(shared);
                state.timer = Some(shared.runtime.spawn(async move {
                    sleep(remaining).await;
                    task_shared.trailing_edge(generation);
                }));
            }
            drop(state);

            if let Some(args) = fire {
                (shared.callback)(args);
            }
        }

        /// Drop any pending trailing call
        pub fn cancel(&self) {
            let mut state = self.shared.state.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.generation = state.generation.wrapping_add(1);
            state.last_args = None;
            state.last_invoke = None;
        }

        /// Whether a trailing call is scheduled
        pub fn is_pending(&self) -> bool {
            self.shared.state.lock().timer.is_some()
        }
    }

    impl<A> Shared<A> {
        fn trailing_edge(&self, generation: u64) {
            let time = Instant::now();
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            let fire = if self.options.trailing {
                state.last_args.take()
            } else {
                state.last_args = None;
                None
            };
            if fire.is_some() {
                state.last_invoke = Some(time);
            }
            drop(state);

            if let Some(args) = fire {
                trace!("throttle firing on trailing edge");
                (self.callback)(args);
            }
        }
    }

}
