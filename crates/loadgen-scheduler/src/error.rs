//! Error types for the scheduler crate.

use std::fmt;
use std::fmt::Display;

/// Real-time error codes (pre-allocated for RT path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RTError {
    /// Sleep until the next period boundary failed
    TimingViolation = 1,
    /// The OS refused part of the real-time setup
    RTSetupFailed = 2,
    /// Invalid configuration parameter
    InvalidConfig = 3,
    /// The loop thread could not be spawned
    ThreadSpawn = 4,
    /// The loop thread panicked before returning
    ThreadPanicked = 5,
}

impl Display for RTError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTError::TimingViolation => write!(f, "Real-time timing violation"),
            RTError::RTSetupFailed => write!(f, "Failed to apply real-time setup"),
            RTError::InvalidConfig => write!(f, "Invalid configuration parameter"),
            RTError::ThreadSpawn => write!(f, "Failed to spawn loop thread"),
            RTError::ThreadPanicked => write!(f, "Loop thread panicked"),
        }
    }
}

impl std::error::Error for RTError {}

/// RT-safe result type
pub type RTResult<T = ()> = Result<T, RTError>;
