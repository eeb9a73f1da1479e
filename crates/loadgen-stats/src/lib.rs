//! # loadgen-stats
//!
//! Bounded-memory latency statistics for periodic request loops.
//!
//! A [`LatencyWindowTracker`] keeps the last `window_size` round-trip times in
//! a fixed ring. Every `window_size` iterations it computes the window's
//! max/min/average and folds them into [`GlobalStatistics`].
//!
//! ## Usage
//!
//! ```rust
//! use loadgen_stats::LatencyWindowTracker;
//!
//! let mut tracker = LatencyWindowTracker::new(3, 1.0);
//! for i in 0..=3u64 {
//!     let outcome = tracker.record(0.5, i);
//!     if let Some(report) = outcome.fold {
//!         assert_eq!(report.global.windows_folded, 1);
//!     }
//! }
//! assert_eq!(tracker.windows_folded(), 1);
//! ```
//!
//! ## Safety Guarantees
//!
//! - **No heap allocations** after construction
//! - **No logging or syscalls**; callers decide how to report outcomes

#![no_std]
#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    missing_docs,
    missing_debug_implementations
)]
#![warn(clippy::pedantic)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod prelude;
pub mod stats;
pub mod window;

pub use stats::{GlobalStatistics, WindowReport, WindowStats};
pub use window::{
    DEFAULT_WARN_THRESHOLD_MS, DEFAULT_WINDOW_SIZE, LatencyWindowTracker, RecordOutcome,
};
