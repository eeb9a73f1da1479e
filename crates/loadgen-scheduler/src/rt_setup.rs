//! Real-time setup configuration.

use crate::error::{RTError, RTResult};

/// Default `SCHED_FIFO` priority for the loop thread.
pub const DEFAULT_RT_PRIORITY: i32 = 80;

/// Scheduling class requested for the thread running the request loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingClass {
    /// Default time-sharing scheduling.
    Normal,
    /// Fixed-priority real-time scheduling.
    ///
    /// On Linux: `SCHED_FIFO` with the given priority (1..=99).
    RealTime {
        /// Static priority; higher preempts lower.
        priority: i32,
    },
}

impl SchedulingClass {
    /// Check if this class asks for real-time scheduling.
    pub fn is_real_time(&self) -> bool {
        matches!(self, SchedulingClass::RealTime { .. })
    }
}

/// Real-time setup configuration.
///
/// This struct defines the real-time parameters applied to the loop thread
/// before its entry point runs.
#[derive(Debug, Clone)]
pub struct RTSetup {
    /// Scheduling class for the loop thread.
    pub class: SchedulingClass,

    /// Enable memory locking (prevent swapping).
    ///
    /// Locks all current and future memory pages to prevent page faults
    /// during real-time operation.
    pub lock_memory: bool,

    /// CPU affinity mask (None = no affinity).
    ///
    /// Restricts the thread to run on specific CPU cores.
    /// Each bit represents a CPU core (bit 0 = core 0, etc.).
    pub cpu_affinity: Option<u64>,
}

impl Default for RTSetup {
    fn default() -> Self {
        Self {
            class: SchedulingClass::RealTime {
                priority: DEFAULT_RT_PRIORITY,
            },
            lock_memory: true,
            cpu_affinity: None,
        }
    }
}

impl RTSetup {
    /// Create a new RTSetup with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a minimal RTSetup (no special configuration).
    pub fn minimal() -> Self {
        Self {
            class: SchedulingClass::Normal,
            lock_memory: false,
            cpu_affinity: None,
        }
    }

    /// Set the scheduling class.
    pub fn with_class(mut self, class: SchedulingClass) -> Self {
        self.class = class;
        self
    }

    /// Set memory locking.
    pub fn with_lock_memory(mut self, enabled: bool) -> Self {
        self.lock_memory = enabled;
        self
    }

    /// Set CPU affinity mask.
    pub fn with_cpu_affinity(mut self, mask: u64) -> Self {
        self.cpu_affinity = Some(mask);
        self
    }

    /// Check if any RT features are enabled.
    pub fn has_rt_features(&self) -> bool {
        self.class.is_real_time() || self.lock_memory || self.cpu_affinity.is_some()
    }

    /// Validate priority range and affinity mask.
    ///
    /// # Errors
    ///
    /// Returns `RTError::InvalidConfig` for a priority outside `1..=99` or an
    /// empty affinity mask.
    pub fn validate(&self) -> RTResult {
        if let SchedulingClass::RealTime { priority } = self.class
            && !(1..=99).contains(&priority)
        {
            return Err(RTError::InvalidConfig);
        }
        if self.cpu_affinity == Some(0) {
            return Err(RTError::InvalidConfig);
        }
        Ok(())
    }
}
