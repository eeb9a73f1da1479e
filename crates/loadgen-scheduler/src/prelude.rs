//! Prelude module for common scheduler types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the scheduler crate.

pub use crate::error::{RTError, RTResult};
pub use crate::pacer::{Pacer, PlatformPacer};
pub use crate::rt_setup::{DEFAULT_RT_PRIORITY, RTSetup, SchedulingClass};
pub use crate::rt_thread::run_with_class;
pub use crate::PERIOD_1KHZ_NS;
