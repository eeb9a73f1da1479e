//! Linux-specific platform implementation.

use crate::error::{RTError, RTResult};
use crate::rt_setup::{RTSetup, SchedulingClass};
use core::time::Duration;
use libc::{
    CLOCK_MONOTONIC, CPU_SET, EINTR, MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, clock_nanosleep,
    cpu_set_t, mlockall, pthread_self, pthread_setschedparam, sched_param, sched_setaffinity,
    timespec,
};
use std::io;
use std::time::Instant;
use tracing::warn;

/// Busy-spin tail before each deadline.
const SPIN_TAIL: Duration = Duration::from_micros(80);

/// Apply Linux-specific RT setup to the calling thread.
///
/// Every requested feature is attempted; refusals are logged individually.
///
/// # Errors
///
/// Returns `RTError::RTSetupFailed` if any feature was refused (typically
/// missing `CAP_SYS_NICE` or `RLIMIT_MEMLOCK`).
pub fn apply_rt_setup(setup: &RTSetup) -> RTResult {
    let mut refused = false;

    if let SchedulingClass::RealTime { priority } = setup.class {
        let param = sched_param {
            sched_priority: priority,
        };
        // SAFETY: pthread_self() is the calling thread and `param` outlives the call.
        let rc = unsafe { pthread_setschedparam(pthread_self(), SCHED_FIFO, &param) };
        if rc != 0 {
            warn!(
                priority,
                error = %io::Error::from_raw_os_error(rc),
                "SCHED_FIFO refused"
            );
            refused = true;
        }
    }

    if setup.lock_memory {
        // SAFETY: mlockall only changes paging policy for this process.
        let rc = unsafe { mlockall(MCL_CURRENT | MCL_FUTURE) };
        if rc != 0 {
            warn!(error = %io::Error::last_os_error(), "mlockall refused");
            refused = true;
        }
    }

    if let Some(mask) = setup.cpu_affinity {
        // SAFETY: an all-zero cpu_set_t is the empty set.
        let mut set: cpu_set_t = unsafe { std::mem::zeroed() };
        for cpu in (0..64usize).filter(|cpu| mask & (1u64 << cpu) != 0) {
            // SAFETY: cpu < 64 is within cpu_set_t's 1024-bit capacity.
            unsafe { CPU_SET(cpu, &mut set) };
        }
        // SAFETY: `set` is a fully initialised cpu_set_t of the size passed.
        let rc = unsafe { sched_setaffinity(0, std::mem::size_of::<cpu_set_t>(), &set) };
        if rc != 0 {
            warn!(mask, error = %io::Error::last_os_error(), "CPU affinity refused");
            refused = true;
        }
    }

    if refused {
        Err(RTError::RTSetupFailed)
    } else {
        Ok(())
    }
}

/// Linux-specific sleep implementation.
#[derive(Debug, Default)]
pub struct PlatformSleep;

impl PlatformSleep {
    /// Platform-specific high-precision sleep with busy-spin tail.
    ///
    /// Uses clock_nanosleep for the bulk of the sleep, then busy-spins
    /// for the final ~80 microseconds to achieve precise timing.
    /// Returns immediately if `target` has already passed.
    pub fn sleep_until(&mut self, target: Instant) -> RTResult {
        loop {
            let now = Instant::now();
            if target <= now {
                return Ok(());
            }

            let remaining = target.duration_since(now);

            // For very short durations, just busy-spin
            if remaining < SPIN_TAIL + Duration::from_micros(20) {
                break;
            }

            let sleep_duration = remaining.saturating_sub(SPIN_TAIL);
            let ts = timespec {
                tv_sec: sleep_duration.as_secs() as libc::time_t,
                tv_nsec: sleep_duration.subsec_nanos() as libc::c_long,
            };

            // SAFETY: `ts` is a valid relative timespec; the remainder pointer may be null.
            let result = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &ts, std::ptr::null_mut()) };
            match result {
                0 => break,
                EINTR => continue,
                _ => return Err(RTError::TimingViolation),
            }
        }

        // Busy-spin for final precision
        while Instant::now() < target {
            std::hint::spin_loop();
        }

        Ok(())
    }
}
