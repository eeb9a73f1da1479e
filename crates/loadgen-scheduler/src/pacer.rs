//! Fixed-period pacing for request loops.
//!
//! A [`Pacer`] supplies the loop's notion of "now" and blocks until a
//! deadline. Each period is anchored to its own iteration's start, so an
//! overrun delays nothing after it and is never made up.

use crate::error::RTResult;
use std::time::Instant;

#[cfg(target_os = "linux")]
use crate::linux::PlatformSleep;

#[cfg(not(target_os = "linux"))]
use crate::fallback::PlatformSleep;

/// Clock and sleep source for a paced loop.
pub trait Pacer {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Block until `deadline`, returning immediately if it has passed.
    ///
    /// # Errors
    ///
    /// Returns `RTError::TimingViolation` if the platform sleep fails.
    fn sleep_until(&mut self, deadline: Instant) -> RTResult;
}

/// Pacer backed by the platform's high-precision sleep.
///
/// # RT-Safety
///
/// `sleep_until` performs no allocations. On Linux it sleeps with
/// `clock_nanosleep(CLOCK_MONOTONIC)` and busy-spins the final ~80µs.
#[derive(Debug, Default)]
pub struct PlatformPacer {
    sleep: PlatformSleep,
}

impl PlatformPacer {
    /// Create a new platform pacer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pacer for PlatformPacer {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&mut self, deadline: Instant) -> RTResult {
        self.sleep.sleep_until(deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_past_deadline_returns_immediately() {
        let mut pacer = PlatformPacer::new();
        let past = pacer.now();
        std::thread::sleep(Duration::from_millis(2));

        let before = Instant::now();
        assert_eq!(pacer.sleep_until(past), Ok(()));
        assert!(before.elapsed() < Duration::from_millis(1));
    }

    #[test]
    fn test_sleep_reaches_deadline() {
        let mut pacer = PlatformPacer::new();
        let deadline = pacer.now() + Duration::from_micros(1500);

        assert_eq!(pacer.sleep_until(deadline), Ok(()));
        assert!(Instant::now() >= deadline);
    }
}
