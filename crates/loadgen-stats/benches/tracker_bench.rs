//! Benchmarks for the latency window tracker.

use criterion::{Criterion, criterion_group, criterion_main};
use loadgen_stats::LatencyWindowTracker;
use std::hint::black_box;

fn bench_record_no_fold(c: &mut Criterion) {
    let mut tracker = LatencyWindowTracker::new(3000, 1.0);
    let mut iteration = 1u64;

    c.bench_function("tracker_record", |b| {
        b.iter(|| {
            // Skip fold iterations so this measures the steady-state path only.
            if iteration % 3000 == 0 {
                iteration += 1;
            }
            black_box(tracker.record(black_box(0.5), iteration));
            iteration += 1;
        });
    });
}

fn bench_record_fold(c: &mut Criterion) {
    let mut tracker = LatencyWindowTracker::new(3000, 1.0);
    for i in 0..3000u64 {
        tracker.record(0.5, i);
    }
    let mut window = 1u64;

    c.bench_function("tracker_fold_3000", |b| {
        b.iter(|| {
            black_box(tracker.record(black_box(0.5), window * 3000));
            window += 1;
        });
    });
}

criterion_group!(benches, bench_record_no_fold, bench_record_fold);
criterion_main!(benches);
