//! Statistics structures for windowed latency tracking.
//!
//! These are POD snapshot types. All latency values are milliseconds.

/// Extrema and mean of one completed window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowStats {
    /// Largest sample in the window.
    pub max: f64,
    /// Smallest sample in the window.
    pub min: f64,
    /// Sum of the window divided by the window capacity.
    pub avg: f64,
}

impl WindowStats {
    /// Create a new `WindowStats` with the given values.
    #[must_use]
    pub const fn from_values(max: f64, min: f64, avg: f64) -> Self {
        Self { max, min, avg }
    }

    /// Compute window statistics over `samples`, dividing the sum by `capacity`.
    ///
    /// Returns `None` for an empty slice or a zero capacity.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "window capacities are far below 2^52")]
    pub fn compute(samples: &[f64], capacity: usize) -> Option<Self> {
        if samples.is_empty() || capacity == 0 {
            return None;
        }

        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        let mut sum = 0.0;
        for &sample in samples {
            max = max.max(sample);
            min = min.min(sample);
            sum += sample;
        }

        Some(Self {
            max,
            min,
            avg: sum / capacity as f64,
        })
    }
}

/// Running statistics across all folded windows.
///
/// `max` never decreases and `min` never increases. `avg` is the unweighted
/// mean of the per-window averages, not the mean of every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobalStatistics {
    /// Largest window maximum seen so far.
    pub max: f64,
    /// Smallest window minimum seen so far.
    pub min: f64,
    /// Running mean of window averages.
    pub avg: f64,
    /// Number of windows folded in.
    pub windows_folded: u64,
}

impl Default for GlobalStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalStatistics {
    /// Create statistics holding the "no data" sentinels.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            min: f64::INFINITY,
            avg: 0.0,
            windows_folded: 0,
        }
    }

    /// Fold one completed window into the running statistics.
    #[expect(clippy::cast_precision_loss, reason = "window counts stay far below 2^52")]
    pub fn fold(&mut self, window: &WindowStats) {
        self.max = self.max.max(window.max);
        self.min = self.min.min(window.min);
        self.windows_folded = self.windows_folded.saturating_add(1);

        let n = self.windows_folded as f64;
        self.avg = ((n - 1.0) * self.avg + window.avg) / n;
    }

    /// Check whether at least one window has been folded.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.windows_folded > 0
    }
}

/// Report produced by a fold, suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowReport {
    /// Iteration index that triggered the fold.
    pub iteration: u64,
    /// Statistics of the window that was just folded.
    pub window: WindowStats,
    /// Global statistics after the fold.
    pub global: GlobalStatistics,
}
