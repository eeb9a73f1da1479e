//! Property-based tests for loadgen-stats using quickcheck.
//!
//! These tests verify invariants of the window tracker for arbitrary inputs.

use loadgen_stats::LatencyWindowTracker;
use quickcheck_macros::quickcheck;

fn to_latency(raw: u16) -> f64 {
    f64::from(raw) / 1000.0
}

#[quickcheck]
fn prop_fold_count_matches_completed_windows(window: u8, windows: u8) -> bool {
    let window = u64::from(window % 16) + 1;
    let windows = u64::from(windows % 8);
    let mut tracker = LatencyWindowTracker::new(window as usize, 1.0);

    for i in 0..=(window * windows) {
        tracker.record(0.5, i);
    }

    tracker.windows_folded() == windows
}

#[quickcheck]
fn prop_global_extrema_are_monotonic(window: u8, samples: Vec<u16>) -> bool {
    let window = usize::from(window % 8) + 1;
    let mut tracker = LatencyWindowTracker::new(window, f64::INFINITY);
    let mut last_max = f64::NEG_INFINITY;
    let mut last_min = f64::INFINITY;

    for (i, &raw) in samples.iter().enumerate() {
        let outcome = tracker.record(to_latency(raw), i as u64);
        if let Some(report) = outcome.fold {
            if report.global.max < last_max || report.global.min > last_min {
                return false;
            }
            last_max = report.global.max;
            last_min = report.global.min;
        }
    }
    true
}

#[quickcheck]
fn prop_global_avg_is_mean_of_window_averages(window: u8, samples: Vec<u16>) -> bool {
    let window = usize::from(window % 8) + 1;
    let mut tracker = LatencyWindowTracker::new(window, f64::INFINITY);
    let mut window_avgs = Vec::new();

    for (i, &raw) in samples.iter().enumerate() {
        if let Some(report) = tracker.record(to_latency(raw), i as u64).fold {
            window_avgs.push(report.window.avg);
        }
    }

    if window_avgs.is_empty() {
        return !tracker.global().has_data();
    }

    let expected = window_avgs.iter().sum::<f64>() / window_avgs.len() as f64;
    (tracker.global().avg - expected).abs() < 1e-9
}

#[quickcheck]
fn prop_slot_holds_most_recent_sample(window: u8, samples: Vec<u16>) -> bool {
    let window = usize::from(window % 8) + 1;
    let mut tracker = LatencyWindowTracker::new(window, 1.0);

    for (i, &raw) in samples.iter().enumerate() {
        tracker.record(to_latency(raw), i as u64);
        let slot = i % window;
        if tracker.samples().get(slot).copied() != Some(to_latency(raw)) {
            return false;
        }
    }
    true
}

#[quickcheck]
fn prop_no_fold_before_window_is_exceeded(window: u8, samples: Vec<u16>) -> bool {
    let window = usize::from(window) + 1;
    let mut tracker = LatencyWindowTracker::new(window, 1.0);

    for (i, &raw) in samples.iter().take(window).enumerate() {
        if tracker.record(to_latency(raw), i as u64).fold.is_some() {
            return false;
        }
    }

    let global = tracker.global();
    !global.has_data() && global.max == f64::NEG_INFINITY && global.min == f64::INFINITY
}
