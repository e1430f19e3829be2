//! Mock implementations of the crate's traits
//!
//! Provides recording and failing doubles for tests.

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
#[cfg(feature = "observability")]
use std::time::Duration;

use parking_lot::Mutex;

#[cfg(feature = "observability")]
use crate::compliance::ReloadHandler;
use crate::storage::{KeyValueStore, StorageError, StorageResult};

type ErrorFactory = Arc<dyn Fn() -> StorageError + Send + Sync>;

/// Reload handler that remembers every request
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use folio_common::compliance::ReloadHandler;
/// use folio_common::testing::RecordingReloader;
///
/// let reloader = RecordingReloader::new();
/// reloader.request_reload(Duration::from_millis(500));
/// assert_eq!(reloader.count(), 1);
/// ```
#[cfg(feature = "observability")]
#[derive(Debug, Clone, Default)]
pub struct RecordingReloader {
    requests: Arc<Mutex<Vec<Duration>>>,
}

#[cfg(feature = "observability")]
impl RecordingReloader {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays of every request so far
    #[must_use]
    pub fn requests(&self) -> Vec<Duration> {
        self.requests.lock().clone()
    }

    /// Number of requests so far
    #[must_use]
    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[cfg(feature = "observability")]
impl ReloadHandler for RecordingReloader {
    fn request_reload(&self, delay: Duration) {
        self.requests.lock().push(delay);
    }
}

/// Store whose every operation fails
///
/// Stands in for a disabled or full storage tier.
#[derive(Clone)]
pub struct FailingStore {
    make_error: ErrorFactory,
}

impl FailingStore {
    /// Fail with errors produced by `make_error`
    pub fn new<F>(make_error: F) -> Self
    where
        F: Fn() -> StorageError + Send + Sync + 'static,
    {
        Self { make_error: Arc::new(make_error) }
    }

    /// Fail every call with `StorageError::Unavailable`
    pub fn unavailable() -> Self {
        Self::new(|| StorageError::Unavailable("storage disabled".to_string()))
    }
}

impl std::fmt::Debug for FailingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailingStore").finish_non_exhaustive()
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> StorageResult<Option<String>> {
        Err((self.make_error)())
    }

    fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
        Err((self.make_error)())
    }

    fn remove(&self, _key: &str) -> StorageResult<()> {
        Err((self.make_error)())
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        Err((self.make_error)())
    }
}

#[cfg(feature = "runtime")]
pub use recorder::CallRecorder;

#[cfg(feature = "runtime")]
mod recorder {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::time::Instant;

    type CallLog<T> = Arc<Mutex<Vec<(Duration, T)>>>;

    /// Records callback invocations with their offset from creation
    ///
    /// Offsets come from `tokio::time::Instant`, so they follow paused time.
    #[derive(Debug)]
    pub struct CallRecorder<T> {
        started: Instant,
        calls: CallLog<T>,
    }

    impl<T> Clone for CallRecorder<T> {
        fn clone(&self) -> Self {
            Self { started: self.started, calls: Arc::clone(&self.calls) }
        }
    }

    impl<T: Send + 'static> CallRecorder<T> {
        /// Start recording now
        pub fn new() -> Self {
            Self { started: Instant::now(), calls: Arc::new(Mutex::new(Vec::new())) }
        }

        /// Callback that appends to this recorder
        pub fn callback(&self) -> impl Fn(T) + Send + Sync + 'static {
            let started = self.started;
            let calls = Arc::clone(&self.calls);
            move |value| calls.lock().push((started.elapsed(), value))
        }

        /// Number of invocations so far
        #[must_use]
        pub fn count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    impl<T: Send + 'static> Default for CallRecorder<T> {
        fn default() -> Self {
            Self::new()
        }
    }

    impl<T: Clone> CallRecorder<T> {
        /// Recorded arguments in call order
        #[must_use]
        pub fn values(&self) -> Vec<T> {
            self.calls.lock().iter().map(|(_, value)| value.clone()).collect()
        }

        /// Recorded `(offset, argument)` pairs
        #[must_use]
        pub fn calls(&self) -> Vec<(Duration, T)> {
            self.calls.lock().clone()
        }
    }
}
