//! Fixed-period request loop with per-window latency reporting.
//!
//! Each iteration refreshes the shared state frame, sends one default
//! `RobotState`, records the round-trip time, and sleeps until
//! `iteration_start + period`. A late iteration is followed immediately by the
//! next one; later deadlines are not shifted to make up for it.
//!
//! ```text
//! Uninitialized --handshake--> Handshaking --ok--> Looping --done--> Completed
//!                                   |                 |
//!                                   +-----error-------+----> AbortedOnFailure
//! ```

use std::time::Duration;

use loadgen_scheduler::{PERIOD_1KHZ_NS, Pacer, PlatformPacer};
use loadgen_schemas::prelude::{RobotClientMetadata, RobotState};
use loadgen_shm::StateFeed;
use loadgen_stats::{
    DEFAULT_WARN_THRESHOLD_MS, DEFAULT_WINDOW_SIZE, GlobalStatistics, LatencyWindowTracker,
    WindowReport,
};
use tracing::{info, warn};

use crate::dispatcher::ControlEndpoint;
use crate::error::{LoopError, LoopResult};

/// Lifecycle of a [`PacedLoopDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Nothing sent yet.
    Uninitialized,
    /// Initialization call in flight.
    Handshaking,
    /// Handshake accepted; iterations may run.
    Looping,
    /// Every requested iteration finished.
    Completed,
    /// Handshake, a control update, or pacing failed.
    AbortedOnFailure,
}

impl LoopState {
    /// Check if the driver can make no further progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Completed | LoopState::AbortedOnFailure)
    }
}

/// Loop parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    /// Total iterations.
    pub num_requests: u64,
    /// Target spacing between iteration starts.
    pub period: Duration,
    /// Iterations per statistics window.
    pub window_size: usize,
    /// Advisory round-trip threshold in milliseconds.
    pub warn_threshold_ms: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            num_requests: 0,
            period: Duration::from_nanos(PERIOD_1KHZ_NS),
            window_size: DEFAULT_WINDOW_SIZE,
            warn_threshold_ms: DEFAULT_WARN_THRESHOLD_MS,
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Iterations whose sample was recorded.
    pub iterations: u64,
    /// Samples above the advisory threshold.
    pub warnings: u64,
    /// Windows folded into `global`.
    pub windows_folded: u64,
    /// Global statistics at the end of the run.
    pub global: GlobalStatistics,
    /// Wall time from the first iteration start to the end of the run.
    pub elapsed: Duration,
}

/// Drives handshake and the paced request loop against a [`ControlEndpoint`].
#[derive(Debug)]
pub struct PacedLoopDriver<E, P = PlatformPacer> {
    config: LoopConfig,
    endpoint: E,
    pacer: P,
    tracker: LatencyWindowTracker,
    state: LoopState,
    iterations: u64,
    warnings: u64,
}

impl<E: ControlEndpoint> PacedLoopDriver<E, PlatformPacer> {
    /// Create a driver paced by the platform clock.
    pub fn new(config: LoopConfig, endpoint: E) -> Self {
        Self::with_pacer(config, endpoint, PlatformPacer::new())
    }
}

impl<E: ControlEndpoint, P: Pacer> PacedLoopDriver<E, P> {
    /// Create a driver with a caller-supplied clock and sleep source.
    pub fn with_pacer(config: LoopConfig, endpoint: E, pacer: P) -> Self {
        let tracker = LatencyWindowTracker::new(config.window_size, config.warn_threshold_ms);
        Self {
            config,
            endpoint,
            pacer,
            tracker,
            state: LoopState::Uninitialized,
            iterations: 0,
            warnings: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Latency statistics recorded so far.
    pub fn tracker(&self) -> &LatencyWindowTracker {
        &self.tracker
    }

    /// Samples above the warning threshold so far.
    pub fn warnings(&self) -> u64 {
        self.warnings
    }

    /// The remote endpoint.
    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    /// Send `metadata` and move to [`LoopState::Looping`] on success.
    ///
    /// # Errors
    ///
    /// - `LoopError::InvalidState` unless the driver is uninitialized
    /// - `LoopError::Handshake` if the call fails; the driver is then aborted
    pub fn handshake(&mut self, metadata: RobotClientMetadata) -> LoopResult<()> {
        if self.state != LoopState::Uninitialized {
            return Err(LoopError::InvalidState {
                operation: "handshake",
                state: self.state,
            });
        }

        self.state = LoopState::Handshaking;
        match self.endpoint.initialize(metadata) {
            Ok(()) => {
                info!("Robot client initialized");
                self.state = LoopState::Looping;
                Ok(())
            }
            Err(e) => {
                self.state = LoopState::AbortedOnFailure;
                Err(LoopError::Handshake(e))
            }
        }
    }

    /// Run `num_requests` iterations, refreshing `feed` before each call.
    ///
    /// # Errors
    ///
    /// - `LoopError::InvalidState` unless the handshake succeeded
    /// - `LoopError::Dispatch` on the first failed control update
    /// - `LoopError::Pacing` if sleeping to the next period fails
    ///
    /// Any error other than `InvalidState` leaves the driver aborted.
    pub fn run<F: StateFeed>(&mut self, feed: &mut F) -> LoopResult<RunSummary> {
        if self.state != LoopState::Looping {
            return Err(LoopError::InvalidState {
                operation: "run",
                state: self.state,
            });
        }

        let run_start = self.pacer.now();
        for iteration in 0..self.config.num_requests {
            if let Err(e) = self.step(feed, iteration) {
                self.state = LoopState::AbortedOnFailure;
                return Err(e);
            }
        }

        self.state = LoopState::Completed;
        let summary = RunSummary {
            iterations: self.iterations,
            warnings: self.warnings,
            windows_folded: self.tracker.windows_folded(),
            global: *self.tracker.global(),
            elapsed: self.pacer.now().saturating_duration_since(run_start),
        };
        info!(
            iterations = summary.iterations,
            warnings = summary.warnings,
            windows = summary.windows_folded,
            elapsed_ms = summary.elapsed.as_secs_f64() * 1000.0,
            "Run complete"
        );
        Ok(summary)
    }

    fn step<F: StateFeed>(&mut self, feed: &mut F, iteration: u64) -> LoopResult<()> {
        let start = self.pacer.now();

        feed.write_synthetic_frame();
        self.endpoint
            .send(RobotState::default())
            .map_err(|source| LoopError::Dispatch { iteration, source })?;

        let end = self.pacer.now();
        let sample_ms = end.saturating_duration_since(start).as_secs_f64() * 1000.0;
        let outcome = self.tracker.record(sample_ms, iteration);
        self.iterations += 1;

        if outcome.exceeded_threshold {
            self.warnings += 1;
            warn!(iteration, "round trip time takes {sample_ms:.3} ms");
        }
        if let Some(report) = outcome.fold {
            log_window(&report);
        }

        let deadline = start.checked_add(self.config.period).unwrap_or(end);
        self.pacer.sleep_until(deadline)?;
        Ok(())
    }
}

fn log_window(report: &WindowReport) {
    info!(
        iteration = report.iteration,
        windows = report.global.windows_folded,
        "Window: max {:.3} ms, min {:.3} ms, avg {:.3} ms | Global: max {:.3} ms, min {:.3} ms, avg {:.3} ms",
        report.window.max,
        report.window.min,
        report.window.avg,
        report.global.max,
        report.global.min,
        report.global.avg,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DispatchError, DispatchResult};
    use loadgen_scheduler::RTResult;
    use loadgen_schemas::prelude::TorqueCommand;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Instant;
    use tracing_test::traced_test;

    /// Clock shared by the simulated endpoint and pacer.
    #[derive(Debug, Clone)]
    struct SimClock(Rc<Cell<Instant>>);

    impl SimClock {
        fn new() -> Self {
            Self(Rc::new(Cell::new(Instant::now())))
        }

        fn advance(&self, by: Duration) {
            self.0.set(self.0.get() + by);
        }
    }

    #[derive(Debug)]
    struct SimPacer {
        clock: SimClock,
        deadlines: Vec<Instant>,
    }

    impl Pacer for SimPacer {
        fn now(&self) -> Instant {
            self.clock.0.get()
        }

        fn sleep_until(&mut self, deadline: Instant) -> RTResult {
            self.deadlines.push(deadline);
            if deadline > self.clock.0.get() {
                self.clock.0.set(deadline);
            }
            Ok(())
        }
    }

    /// Endpoint that takes a fixed simulated latency per call.
    #[derive(Debug)]
    struct SimEndpoint {
        clock: SimClock,
        latency: Duration,
        slow_call: Option<(u64, Duration)>,
        fail_call: Option<u64>,
        reject_init: bool,
        calls: u64,
        initialized: bool,
    }

    impl SimEndpoint {
        fn new(clock: &SimClock, latency: Duration) -> Self {
            Self {
                clock: clock.clone(),
                latency,
                slow_call: None,
                fail_call: None,
                reject_init: false,
                calls: 0,
                initialized: false,
            }
        }
    }

    impl ControlEndpoint for SimEndpoint {
        fn initialize(&mut self, _metadata: RobotClientMetadata) -> DispatchResult<()> {
            if self.reject_init {
                return Err(DispatchError::from(tonic::Status::unavailable("not ready")));
            }
            self.initialized = true;
            Ok(())
        }

        fn send(&mut self, _state: RobotState) -> DispatchResult<TorqueCommand> {
            self.calls += 1;
            if self.fail_call == Some(self.calls) {
                return Err(DispatchError::from(tonic::Status::internal("controller fault")));
            }
            let latency = match self.slow_call {
                Some((call, latency)) if call == self.calls => latency,
                _ => self.latency,
            };
            self.clock.advance(latency);
            Ok(TorqueCommand::default())
        }
    }

    #[derive(Debug, Default)]
    struct CountingFeed {
        frames: u64,
    }

    impl StateFeed for CountingFeed {
        fn write_synthetic_frame(&mut self) {
            self.frames += 1;
        }

        fn num_dofs(&self) -> usize {
            7
        }
    }

    fn driver(
        config: LoopConfig,
        endpoint: SimEndpoint,
        clock: &SimClock,
    ) -> PacedLoopDriver<SimEndpoint, SimPacer> {
        let pacer = SimPacer {
            clock: clock.clone(),
            deadlines: Vec::new(),
        };
        PacedLoopDriver::with_pacer(config, endpoint, pacer)
    }

    fn config(num_requests: u64, window_size: usize) -> LoopConfig {
        LoopConfig {
            num_requests,
            window_size,
            ..LoopConfig::default()
        }
    }

    #[test]
    fn test_default_loop_config_runs_at_1khz() {
        let config = LoopConfig::default();
        assert_eq!(config.period, Duration::from_millis(1));
        assert_eq!(config.window_size, 3000);
    }

    #[test]
    #[traced_test]
    fn test_failure_mid_run_aborts_after_one_fold() {
        let clock = SimClock::new();
        let mut endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        endpoint.fail_call = Some(5000);
        let mut driver = driver(config(9000, 3000), endpoint, &clock);
        let mut feed = CountingFeed::default();

        assert_eq!(driver.handshake(RobotClientMetadata::default()).ok(), Some(()));
        assert_eq!(driver.state(), LoopState::Looping);

        match driver.run(&mut feed) {
            Err(LoopError::Dispatch { iteration, .. }) => assert_eq!(iteration, 4999),
            other => panic!("unexpected result: {other:?}"),
        }

        assert_eq!(driver.state(), LoopState::AbortedOnFailure);
        assert_eq!(driver.tracker().count(), 4999);
        assert_eq!(driver.tracker().windows_folded(), 1);
        assert_eq!(driver.endpoint().calls, 5000);
        assert_eq!(feed.frames, 5000);
        assert_eq!(driver.warnings(), 0);
        assert!(!logs_contain("round trip time takes"));

        let global = driver.tracker().global();
        assert!((global.avg - 0.5).abs() < 1e-9);
        assert!((global.max - 0.5).abs() < 1e-9);
        assert!((global.min - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_full_run_completes() {
        let clock = SimClock::new();
        let endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        let mut driver = driver(config(9000, 3000), endpoint, &clock);
        let mut feed = CountingFeed::default();

        assert!(driver.handshake(RobotClientMetadata::default()).is_ok());
        let summary = match driver.run(&mut feed) {
            Ok(summary) => summary,
            Err(e) => panic!("run failed: {e}"),
        };

        assert_eq!(driver.state(), LoopState::Completed);
        assert_eq!(summary.iterations, 9000);
        assert_eq!(summary.warnings, 0);
        // Folds at iterations 3000 and 6000; iteration 9000 is never reached.
        assert_eq!(summary.windows_folded, 2);
        // Every period is exactly 1 ms on the simulated clock.
        assert_eq!(summary.elapsed, Duration::from_millis(9000));
    }

    #[test]
    fn test_deadlines_anchor_to_iteration_start() {
        let clock = SimClock::new();
        let mut endpoint = SimEndpoint::new(&clock, Duration::from_micros(200));
        endpoint.slow_call = Some((2, Duration::from_micros(3500)));
        let mut driver = driver(config(4, 10), endpoint, &clock);
        let mut feed = CountingFeed::default();
        let t0 = clock.0.get();

        assert!(driver.handshake(RobotClientMetadata::default()).is_ok());
        assert!(driver.run(&mut feed).is_ok());

        let ms = Duration::from_millis(1);
        // Iteration 1 overruns to t0 + 4.5 ms; iteration 2 starts there with no catch-up.
        let expected = [
            t0 + ms,
            t0 + ms * 2,
            t0 + Duration::from_micros(4500) + ms,
            t0 + Duration::from_micros(5500) + ms,
        ];
        assert_eq!(driver.pacer.deadlines, expected);
    }

    #[test]
    #[traced_test]
    fn test_single_overrun_warns_once() {
        let clock = SimClock::new();
        let mut endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        endpoint.slow_call = Some((7, Duration::from_micros(1200)));
        let mut driver = driver(config(20, 10), endpoint, &clock);
        let mut feed = CountingFeed::default();

        assert!(driver.handshake(RobotClientMetadata::default()).is_ok());
        let summary = match driver.run(&mut feed) {
            Ok(summary) => summary,
            Err(e) => panic!("run failed: {e}"),
        };

        assert_eq!(summary.warnings, 1);
        assert_eq!(summary.windows_folded, 1);
        assert!(logs_contain("round trip time takes 1.200 ms"));
        assert!(logs_contain("Window: max 1.200 ms"));
        assert!((summary.global.max - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_short_run_keeps_sentinels() {
        let clock = SimClock::new();
        let endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        let mut driver = driver(config(100, 3000), endpoint, &clock);

        assert!(driver.handshake(RobotClientMetadata::default()).is_ok());
        let summary = match driver.run(&mut CountingFeed::default()) {
            Ok(summary) => summary,
            Err(e) => panic!("run failed: {e}"),
        };

        assert_eq!(summary.windows_folded, 0);
        assert!(!summary.global.has_data());
        assert!(summary.global.max.is_infinite() && summary.global.max.is_sign_negative());
        assert!(summary.global.min.is_infinite() && summary.global.min.is_sign_positive());
    }

    #[test]
    fn test_rejected_handshake_aborts() {
        let clock = SimClock::new();
        let mut endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        endpoint.reject_init = true;
        let mut driver = driver(config(10, 5), endpoint, &clock);

        let err = match driver.handshake(RobotClientMetadata::default()) {
            Err(e) => e,
            Ok(()) => panic!("handshake accepted"),
        };
        assert!(err.is_fatal_at_startup());
        assert_eq!(driver.state(), LoopState::AbortedOnFailure);
        assert!(!driver.endpoint().initialized);
        assert_eq!(driver.endpoint().calls, 0);
    }

    #[test]
    fn test_run_requires_handshake() {
        let clock = SimClock::new();
        let endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        let mut driver = driver(config(10, 5), endpoint, &clock);

        assert!(matches!(
            driver.run(&mut CountingFeed::default()),
            Err(LoopError::InvalidState {
                operation: "run",
                state: LoopState::Uninitialized,
            })
        ));
        assert_eq!(driver.endpoint().calls, 0);
    }

    #[test]
    fn test_second_handshake_rejected() {
        let clock = SimClock::new();
        let endpoint = SimEndpoint::new(&clock, Duration::from_micros(500));
        let mut driver = driver(config(1, 5), endpoint, &clock);

        assert!(driver.handshake(RobotClientMetadata::default()).is_ok());
        assert!(matches!(
            driver.handshake(RobotClientMetadata::default()),
            Err(LoopError::InvalidState {
                state: LoopState::Looping,
                ..
            })
        ));
        assert!(!driver.state().is_terminal());
    }
}
