//! Fallback platform implementation for non-Linux systems.

use crate::error::{RTError, RTResult};
use crate::rt_setup::RTSetup;
use std::time::Instant;
use tracing::warn;

/// Apply RT setup (unsupported on this platform).
///
/// # Errors
///
/// Returns `RTError::RTSetupFailed` if any RT feature was requested.
pub fn apply_rt_setup(setup: &RTSetup) -> RTResult {
    if setup.has_rt_features() {
        warn!("real-time scheduling is not supported on this platform");
        return Err(RTError::RTSetupFailed);
    }
    Ok(())
}

/// Fallback sleep implementation using standard library.
#[derive(Debug, Default)]
pub struct PlatformSleep;

impl PlatformSleep {
    /// Fallback sleep using standard thread::sleep.
    pub fn sleep_until(&mut self, target: Instant) -> RTResult {
        let now = Instant::now();
        if target > now {
            std::thread::sleep(target.duration_since(now));
        }
        Ok(())
    }
}
