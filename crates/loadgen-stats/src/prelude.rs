//! Prelude module for common statistics types.

pub use crate::stats::{GlobalStatistics, WindowReport, WindowStats};
pub use crate::window::{
    DEFAULT_WARN_THRESHOLD_MS, DEFAULT_WINDOW_SIZE, LatencyWindowTracker, RecordOutcome,
};
