//! Scroll progress bar and back-to-top button state

use std::time::Duration;

use folio_common::time::{Clock, SystemClock, Throttle};
use serde::Serialize;

use crate::config::UiConfig;
use crate::error::Result;

/// Viewport geometry sampled on a scroll event, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, viewport_height: f64, document_height: f64) -> Self {
        Self { scroll_top, viewport_height, document_height }
    }

    /// How far down the page the viewport is, 0 to 100
    ///
    /// A page that fits in the viewport reports 0.
    pub fn progress_percent(&self) -> f64 {
        let scrollable = self.document_height - self.viewport_height;
        if scrollable <= 0.0 || !scrollable.is_finite() {
            return 0.0;
        }
        (self.scroll_top / scrollable * 100.0).clamp(0.0, 100.0)
    }

    pub fn back_to_top_visible(&self, threshold: f64) -> bool {
        self.scroll_top > threshold
    }

    /// Whether the header should switch to its compact style
    pub fn header_scrolled(&self, offset: f64) -> bool {
        self.scroll_top > offset
    }
}

/// What the page chrome should show after a scroll event
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollState {
    pub progress_percent: f64,
    pub back_to_top_visible: bool,
    pub header_scrolled: bool,
}

impl ScrollState {
    pub fn from_metrics(metrics: &ScrollMetrics, ui: &UiConfig) -> Self {
        Self {
            progress_percent: metrics.progress_percent(),
            back_to_top_visible: metrics.back_to_top_visible(ui.back_to_top_threshold),
            header_scrolled: metrics.header_scrolled(ui.scroll_offset),
        }
    }
}

/// Throttled scroll handler
///
/// Scroll events arriving inside the throttle interval are dropped.
pub struct ScrollTracker<C: Clock = SystemClock> {
    throttle: Throttle<ScrollMetrics, C>,
}

impl ScrollTracker<SystemClock> {
    /// Tracker on the system clock
    ///
    /// # Errors
    /// Returns `FolioError::Config` for a zero `interval`.
    pub fn new<F>(ui: UiConfig, interval: Duration, handler: F) -> Result<Self>
    where
        F: Fn(ScrollState) + Send + Sync + 'static,
    {
        Self::with_clock(ui, interval, SystemClock, handler)
    }
}

impl<C: Clock> ScrollTracker<C> {
    /// Tracker reading time from `clock`
    ///
    /// # Errors
    /// Returns `FolioError::Config` for a zero `interval`.
    pub fn with_clock<F>(ui: UiConfig, interval: Duration, clock: C, handler: F) -> Result<Self>
    where
        F: Fn(ScrollState) + Send + Sync + 'static,
    {
        let throttle = Throttle::with_clock(interval, clock, move |metrics: ScrollMetrics| {
            handler(ScrollState::from_metrics(&metrics, &ui));
        })?;
        Ok(Self { throttle })
    }

    /// Feed one scroll event; returns whether the handler ran
    pub fn on_scroll(&self, metrics: ScrollMetrics) -> bool {
        self.throttle.call(metrics)
    }

    pub fn interval(&self) -> Duration {
        self.throttle.interval()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for scroll.
    use folio_common::testing::CallRecorder;
    use folio_common::MockClock;

    use super::*;

    /// Validates progress calculation.
    ///
    /// Assertions:
    /// - Confirms halfway scrolling reports 50%.
    /// - Confirms overscroll is clamped.
    /// - Confirms pages shorter than the viewport report 0.
    #[test]
    fn test_progress_percent() {
        assert!((ScrollMetrics::new(500.0, 800.0, 1800.0).progress_percent() - 50.0).abs() < 1e-9);
        assert!((ScrollMetrics::new(1200.0, 800.0, 1800.0).progress_percent() - 100.0).abs() < 1e-9);
        assert!(ScrollMetrics::new(-30.0, 800.0, 1800.0).progress_percent().abs() < 1e-9);
        assert!(ScrollMetrics::new(0.0, 800.0, 600.0).progress_percent().abs() < 1e-9);
    }

    /// Validates back-to-top visibility uses a strict threshold.
    ///
    /// Assertions:
    /// - Confirms exactly the threshold is still hidden.
    #[test]
    fn test_back_to_top_threshold() {
        let ui = UiConfig::default();
        let at = ScrollState::from_metrics(&ScrollMetrics::new(300.0, 800.0, 4000.0), &ui);
        let past = ScrollState::from_metrics(&ScrollMetrics::new(301.0, 800.0, 4000.0), &ui);
        assert!(!at.back_to_top_visible);
        assert!(past.back_to_top_visible);
        assert!(past.header_scrolled);
    }

    /// Validates throttled delivery of scroll events.
    ///
    /// Assertions:
    /// - Confirms events inside the interval are dropped.
    /// - Confirms the handler sees state computed from delivered events.
    #[test]
    fn test_tracker_throttles() {
        let clock = MockClock::new();
        let recorder = CallRecorder::new();
        let tracker = ScrollTracker::with_clock(
            UiConfig::default(),
            Duration::from_millis(10),
            clock.clone(),
            recorder.callback(),
        )
        .unwrap();

        assert!(tracker.on_scroll(ScrollMetrics::new(0.0, 800.0, 1800.0)));
        clock.advance(Duration::from_millis(4));
        assert!(!tracker.on_scroll(ScrollMetrics::new(100.0, 800.0, 1800.0)));
        clock.advance(Duration::from_millis(6));
        assert!(tracker.on_scroll(ScrollMetrics::new(500.0, 800.0, 1800.0)));

        let states = recorder.values();
        assert_eq!(states.len(), 2);
        assert!((states[1].progress_percent - 50.0).abs() < 1e-9);
        assert!(states[1].back_to_top_visible);
    }

    /// Validates a zero interval is rejected.
    ///
    /// Assertions:
    /// - Ensures a configuration error.
    #[test]
    fn test_zero_interval() {
        let result = ScrollTracker::new(UiConfig::default(), Duration::ZERO, |_| {});
        assert!(matches!(result, Err(crate::error::FolioError::Config(_))));
    }
}
