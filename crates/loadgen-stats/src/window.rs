//! Fixed-capacity latency window with periodic folding into global statistics.

use alloc::boxed::Box;
use alloc::vec;

use crate::stats::{GlobalStatistics, WindowReport, WindowStats};

/// Default number of samples per window.
pub const DEFAULT_WINDOW_SIZE: usize = 3000;

/// Default advisory threshold in milliseconds.
pub const DEFAULT_WARN_THRESHOLD_MS: f64 = 1.0;

/// Result of recording one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordOutcome {
    /// The sample exceeded the advisory threshold.
    pub exceeded_threshold: bool,
    /// Present when this sample completed a window and triggered a fold.
    pub fold: Option<WindowReport>,
}

/// Ring of per-iteration round-trip times with running global statistics.
///
/// Samples land in `buffer[iteration % window_size]`. A fold happens when
/// `iteration > 0 && iteration % window_size == 0`, after the sample for that
/// iteration has been written, so the folded window holds samples
/// `iteration - window_size + 1 ..= iteration` when iterations are consecutive.
/// Slots are overwritten in place rather than evicted, and a fold reads the
/// whole ring as it stands.
///
/// # RT Safety
///
/// The buffer is allocated once in [`LatencyWindowTracker::new`]. `record` is
/// allocation-free and O(1) except on fold iterations, which are O(window_size).
#[derive(Debug, Clone)]
pub struct LatencyWindowTracker {
    buffer: Box<[f64]>,
    filled: usize,
    count: u64,
    warn_threshold_ms: f64,
    global: GlobalStatistics,
}

impl LatencyWindowTracker {
    /// Create a tracker with `window_size` slots (at least one).
    #[must_use]
    pub fn new(window_size: usize, warn_threshold_ms: f64) -> Self {
        Self {
            buffer: vec![0.0; window_size.max(1)].into_boxed_slice(),
            filled: 0,
            count: 0,
            warn_threshold_ms,
            global: GlobalStatistics::new(),
        }
    }

    /// Record the round-trip time of iteration `iteration` in milliseconds.
    #[expect(clippy::cast_possible_truncation, reason = "slot index is below window_size")]
    pub fn record(&mut self, sample_ms: f64, iteration: u64) -> RecordOutcome {
        let window_size = self.buffer.len() as u64;
        let slot = (iteration % window_size) as usize;
        if let Some(cell) = self.buffer.get_mut(slot) {
            *cell = sample_ms;
        }
        self.filled = self.filled.max(slot.saturating_add(1));
        self.count = self.count.saturating_add(1);

        let exceeded_threshold = sample_ms > self.warn_threshold_ms;

        let fold = if iteration > 0 && iteration % window_size == 0 {
            self.fold(iteration)
        } else {
            None
        };

        RecordOutcome {
            exceeded_threshold,
            fold,
        }
    }

    fn fold(&mut self, iteration: u64) -> Option<WindowReport> {
        let samples = self.buffer.get(..self.filled)?;
        let window = WindowStats::compute(samples, self.buffer.len())?;
        self.global.fold(&window);

        Some(WindowReport {
            iteration,
            window,
            global: self.global,
        })
    }

    /// Number of slots in the ring.
    #[must_use]
    pub fn window_size(&self) -> usize {
        self.buffer.len()
    }

    /// Advisory threshold in milliseconds.
    #[must_use]
    pub fn warn_threshold_ms(&self) -> f64 {
        self.warn_threshold_ms
    }

    /// Number of samples recorded since creation.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Current contents of the ring, in slot order.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        self.buffer.get(..self.filled).unwrap_or_default()
    }

    /// Global statistics over every fold so far.
    #[must_use]
    pub fn global(&self) -> &GlobalStatistics {
        &self.global
    }

    /// Number of windows folded so far.
    #[must_use]
    pub fn windows_folded(&self) -> u64 {
        self.global.windows_folded
    }
}

impl Default for LatencyWindowTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE, DEFAULT_WARN_THRESHOLD_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_defaults() {
        let tracker = LatencyWindowTracker::default();
        assert_eq!(tracker.window_size(), 3000);
        assert!((tracker.warn_threshold_ms() - 1.0).abs() < f64::EPSILON);
        assert_eq!(tracker.count(), 0);
        assert!(tracker.samples().is_empty());
    }

    #[test]
    fn test_zero_window_size_clamped() {
        let tracker = LatencyWindowTracker::new(0, 1.0);
        assert_eq!(tracker.window_size(), 1);
    }

    #[test]
    fn test_fills_like_append_before_first_wrap() {
        let mut tracker = LatencyWindowTracker::new(4, 1.0);
        for i in 0..3u64 {
            tracker.record(i as f64, i);
        }
        assert_eq!(tracker.samples(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_first_fold_overwrites_slot_zero_first() {
        let mut tracker = LatencyWindowTracker::new(4, 10.0);
        for i in 0..4u64 {
            assert!(tracker.record(i as f64, i).fold.is_none());
        }

        let outcome = tracker.record(4.0, 4);
        assert_eq!(tracker.samples(), &[4.0, 1.0, 2.0, 3.0]);

        let Some(report) = outcome.fold else {
            panic!("iteration 4 must fold a window of 4");
        };
        assert_eq!(report.iteration, 4);
        assert!((report.window.max - 4.0).abs() < f64::EPSILON);
        assert!((report.window.min - 1.0).abs() < f64::EPSILON);
        assert!((report.window.avg - 2.5).abs() < f64::EPSILON);
        assert_eq!(report.global.windows_folded, 1);
    }

    #[test]
    fn test_threshold_is_strictly_greater() {
        let mut tracker = LatencyWindowTracker::new(8, 1.0);
        assert!(!tracker.record(1.0, 0).exceeded_threshold);
        assert!(tracker.record(1.2, 1).exceeded_threshold);
        assert!(!tracker.record(0.3, 2).exceeded_threshold);
    }

    #[test]
    fn test_iteration_zero_never_folds() {
        let mut tracker = LatencyWindowTracker::new(1, 1.0);
        assert!(tracker.record(0.5, 0).fold.is_none());
        assert!(tracker.record(0.5, 1).fold.is_some());
    }
}
