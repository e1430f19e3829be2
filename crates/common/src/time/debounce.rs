//! Debounce wrappers
//!
//! [`Debounce`] delays a callback until calls stop arriving for `wait`.
//! [`AdvancedDebounce`] adds leading-edge invocation, a `max_wait` ceiling
//! under continuous activity, and cancellation.
//!
//! Both wrappers schedule their timers on the tokio runtime that was current
//! when they were built. State sits behind a mutex; each scheduled timer
//! carries a generation number and does nothing if a newer timer replaced it.
//! Callbacks always run with the lock released.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use folio_common::time::Debounce;
//!
//! # async fn demo() -> Result<(), folio_common::time::TimingError> {
//! let save = Debounce::new(Duration::from_millis(300), |query: String| {
//!     println!("searching for {query}");
//! })?;
//!
//! save.call("r".to_string());
//! save.call("ru".to_string());
//! save.call("rust".to_string()); // only this one is delivered
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::trace;

use super::error::{TimingError, TimingResult};
use super::{current_runtime, Callback};

struct DebounceState<A> {
    pending: Option<A>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

struct DebounceShared<A> {
    callback: Callback<A>,
    wait: Duration,
    immediate: bool,
    runtime: Handle,
    state: Mutex<DebounceState<A>>,
}

/// Trailing (or immediate) debounce
///
/// Each call restarts the `wait` timer. In trailing mode the callback fires
/// once the timer runs out, with the arguments of the last call. In
/// immediate mode the first call of a quiet period fires at once with its
/// own arguments, and nothing fires when the timer runs out.
pub struct Debounce<A> {
    shared: Arc<DebounceShared<A>>,
}

impl<A> Clone for Debounce<A> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<A: Send + 'static> Debounce<A> {
    /// Build a trailing debounce
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::ZeroDuration`] for a zero `wait` and
    /// [`TimingError::NoRuntime`] outside a tokio runtime.
    pub fn new<F>(wait: Duration, callback: F) -> TimingResult<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_mode(wait, false, callback)
    }

    /// Build a debounce that fires on the first call of each quiet period
    ///
    /// # Errors
    ///
    /// Same as [`Debounce::new`].
    pub fn immediate<F>(wait: Duration, callback: F) -> TimingResult<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self::with_mode(wait, true, callback)
    }

    fn with_mode<F>(wait: Duration, immediate: bool, callback: F) -> TimingResult<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        TimingError::ensure_positive("wait", wait)?;
        let runtime = current_runtime()?;

        Ok(Self {
            shared: Arc::new(DebounceShared {
                callback: Arc::new(callback),
                wait,
                immediate,
                runtime,
                state: Mutex::new(DebounceState { pending: None, timer: None, generation: 0 }),
            }),
        })
    }

    /// Record a call
    pub fn call(&self, args: A) {
        let shared = &self.shared;
        let mut state = shared.state.lock();

        let quiet = state.timer.is_none();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let fire_now = if shared.immediate {
            quiet.then_some(args)
        } else {
            state.pending = Some(args);
            None
        };

        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let task_shared = Arc::clone(shared);
        state.timer = Some(shared.runtime.spawn(async move {
            sleep(task_shared.wait).await;
            task_shared.on_timer(generation);
        }));
        drop(state);

        if let Some(args) = fire_now {
            trace!("debounce firing on leading call");
            (shared.callback)(args);
        }
    }

    /// Whether a timer is currently running
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().timer.is_some()
    }

    /// Configured quiet period
    pub fn wait(&self) -> Duration {
        self.shared.wait
    }
}

impl<A> DebounceShared<A> {
    fn on_timer(&self, generation: u64) {
        let mut state = self.state.lock();
        if state.generation != generation {
            return;
        }
        state.timer = None;
        let args = state.pending.take();
        drop(state);

        if let Some(args) = args {
            trace!("debounce firing after quiet period");
            (self.callback)(args);
        }
    }
}

/// Options for [`AdvancedDebounce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceOptions {
    /// Fire on the first call of a burst
    pub leading: bool,
    /// Fire after the burst goes quiet
    pub trailing: bool,
    /// Upper bound on the delay between invocations under continuous calls
    pub max_wait: Option<Duration>,
}

impl Default for DebounceOptions {
    fn default() -> Self {
        Self { leading: false, trailing: true, max_wait: None }
    }
}

impl DebounceOptions {
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

    /// Set the `max_wait` ceiling
    #[must_use]
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }
}

struct AdvancedState<A> {
    last_args: Option<A>,
    last_call: Option<Instant>,
    last_invoke: Option<Instant>,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

impl<A> AdvancedState<A> {
    fn invoke(&mut self, time: Instant) -> Option<A> {
        self.last_invoke = Some(time);
        self.last_args.take()
    }
}

struct AdvancedShared<A> {
    callback: Callback<A>,
    wait: Duration,
    leading: bool,
    trailing: bool,
    max_wait: Option<Duration>,
    runtime: Handle,
    state: Mutex<AdvancedState<A>>,
}

/// Debounce with leading/trailing edges, `max_wait` and cancellation
pub struct AdvancedDebounce<A> {
    shared: Arc<AdvancedShared<A>>,
}

impl<A> Clone for AdvancedDebounce<A> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<A: Send + 'static> AdvancedDebounce<A> {
    /// Build an advanced debounce
    ///
    /// `max_wait` shorter than `wait` is raised to `wait`.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::ZeroDuration`] for a zero `wait` or
    /// `max_wait`, [`TimingError::NoEdgeEnabled`] when both edges are off,
    /// and [`TimingError::NoRuntime`] outside a tokio runtime.
    pub fn new<F>(wait: Duration, options: DebounceOptions, callback: F) -> TimingResult<Self>
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        TimingError::ensure_positive("wait", wait)?;
        if let Some(max_wait) = options.max_wait {
            TimingError::ensure_positive("max_wait", max_wait)?;
        }
        if !options.leading && !options.trailing {
            return Err(TimingError::NoEdgeEnabled);
        }
        let runtime = current_runtime()?;

        Ok(Self {
            shared: Arc::new(AdvancedShared {
                callback: Arc::new(callback),
                wait,
                leading: options.leading,
                trailing: options.trailing,
                max_wait: options.max_wait.map(|max_wait| max_wait.max(wait)),
                runtime,
                state: Mutex::new(AdvancedState {
                    last_args: None,
                    last_call: None,
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

        let invoking = shared.should_invoke(&state, time);
        state.last_args = Some(args);
        state.last_call = Some(time);

        let mut fire = None;
        if invoking {
            if state.timer.is_none() {
                // Leading edge of a new burst
                state.last_invoke = Some(time);
                AdvancedShared::schedule(shared, &mut state, shared.wait);
                if shared.leading {
                    fire = state.invoke(time);
                }
            } else if shared.max_wait.is_some() {
                AdvancedShared::schedule(shared, &mut state, shared.wait);
                fire = state.invoke(time);
            }
        } else if state.timer.is_none() {
            AdvancedShared::schedule(shared, &mut state, shared.wait);
        }
        drop(state);

        if let Some(args) = fire {
            (shared.callback)(args);
        }
    }

    /// Drop any pending timer and captured arguments without invoking
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.last_args = None;
        state.last_call = None;
        state.last_invoke = None;
    }

    /// Whether a timer is currently running
    pub fn is_pending(&self) -> bool {
        self.shared.state.lock().timer.is_some()
    }
}

impl<A: Send + 'static> AdvancedShared<A> {
    fn should_invoke(&self, state: &AdvancedState<A>, time: Instant) -> bool {
        let Some(last_call) = state.last_call else {
            return true;
        };
        if time.saturating_duration_since(last_call) >= self.wait {
            return true;
        }
        match (self.max_wait, state.last_invoke) {
            (Some(max_wait), Some(last_invoke)) => {
                time.saturating_duration_since(last_invoke) >= max_wait
            }
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    fn remaining_wait(&self, state: &AdvancedState<A>, time: Instant) -> Duration {
        let since_call =
            state.last_call.map_or(self.wait, |last| time.saturating_duration_since(last));
        let waiting = self.wait.saturating_sub(since_call);
        match (self.max_wait, state.last_invoke) {
            (Some(max_wait), Some(last_invoke)) => {
                waiting.min(max_wait.saturating_sub(time.saturating_duration_since(last_invoke)))
            }
            _ => waiting,
        }
    }

    fn schedule(shared: &Arc<Self>, state: &mut AdvancedState<A>, delay: Duration) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let task_shared = Arc::clone(shared);
        state.timer = Some(shared.runtime.spawn(async move {
            sleep(delay).await;
            Self::on_timer(&task_shared, generation);
        }));
    }

    fn on_timer(shared: &Arc<Self>, generation: u64) {
        let time = Instant::now();
        let mut state = shared.state.lock();
        if state.generation != generation {
            return;
        }
        // Detach our own handle so rescheduling does not abort this task
        state.timer = None;

        if !shared.should_invoke(&state, time) {
            let delay = shared.remaining_wait(&state, time);
            Self::schedule(shared, &mut state, delay);
            return;
        }

        let fire = if shared.trailing && state.last_args.is_some() {
            state.invoke(time)
        } else {
            state.last_args = None;
            None
        };
        drop(state);

        if let Some(args) = fire {
            trace!("advanced debounce firing on trailing edge");
            (shared.callback)(args);
        }
    }
}
