//! Real-time thread setup and fixed-period pacing for request loops.
//!
//! This crate provides the two timing capabilities a paced request loop needs:
//!
//! - **run_with_class**: run an entry point on a thread with a requested
//!   scheduling class (`SCHED_FIFO`, memory locking, CPU affinity)
//! - **Pacer**: a clock plus "sleep until deadline" with a busy-spin tail
//!
//! # RT-Safety Guarantees
//!
//! - **No heap allocations** in `Pacer::sleep_until`
//! - **Bounded execution time**: sleeps never extend past the deadline by more
//!   than scheduler wake-up latency
//!
//! # Example
//!
//! ```no_run
//! use loadgen_scheduler::{Pacer, PlatformPacer, RTSetup, run_with_class};
//! use std::time::Duration;
//!
//! let result = run_with_class("control-loop", &RTSetup::default(), || {
//!     let mut pacer = PlatformPacer::new();
//!     for _ in 0..1000 {
//!         let start = pacer.now();
//!         // Issue one request here
//!         pacer.sleep_until(start + Duration::from_millis(1))?;
//!     }
//!     Ok::<(), loadgen_scheduler::RTError>(())
//! });
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod error;
pub mod pacer;
pub mod rt_setup;
pub mod rt_thread;

#[cfg(target_os = "linux")]
#[expect(unsafe_code, reason = "libc scheduling and clock calls")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod fallback;

pub mod prelude;

pub use error::{RTError, RTResult};
pub use pacer::{Pacer, PlatformPacer};
pub use rt_setup::{DEFAULT_RT_PRIORITY, RTSetup, SchedulingClass};
pub use rt_thread::run_with_class;

/// Default loop period in nanoseconds (1ms)
pub const PERIOD_1KHZ_NS: u64 = 1_000_000;
