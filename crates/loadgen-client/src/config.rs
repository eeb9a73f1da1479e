//! Client configuration loaded from a YAML file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use loadgen_scheduler::{DEFAULT_RT_PRIORITY, RTSetup, SchedulingClass};
use loadgen_shm::DEFAULT_SEGMENT_NAME;
use loadgen_stats::{DEFAULT_WARN_THRESHOLD_MS, DEFAULT_WINDOW_SIZE};
use serde::Deserialize;

use crate::dispatcher::normalize_address;
use crate::driver::LoopConfig;
use crate::error::{ConfigError, ConfigResult};

/// Load generator configuration.
///
/// Unknown keys are ignored so the same file can carry settings for other
/// tools.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Element count of each joint vector.
    pub num_dofs: usize,
    /// Total number of control updates to send.
    pub num_requests: u64,
    /// gRPC endpoint, with or without a scheme.
    pub server_address: String,
    /// Serialized `RobotClientMetadata` sent at handshake.
    ///
    /// A relative path is taken relative to the config file's directory, not
    /// the working directory.
    pub robot_client_metadata_path: PathBuf,
    /// Run the loop on a real-time scheduled thread.
    pub use_real_time: bool,

    /// Loop period in milliseconds.
    #[serde(default = "default_period_ms")]
    pub period_ms: f64,
    /// Iterations per statistics window.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Round trips above this many milliseconds are reported.
    #[serde(default = "default_warn_threshold_ms")]
    pub warn_threshold_ms: f64,
    /// Shared memory segment to attach.
    #[serde(default = "default_shm_name")]
    pub shm_name: String,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// `SCHED_FIFO` priority when `use_real_time` is set.
    #[serde(default = "default_rt_priority")]
    pub rt_priority: i32,
    /// Lock process memory when `use_real_time` is set.
    #[serde(default = "default_lock_memory")]
    pub lock_memory: bool,
    /// CPU mask for the loop thread when `use_real_time` is set.
    #[serde(default)]
    pub cpu_affinity: Option<u64>,
}

fn default_period_ms() -> f64 {
    1.0
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_warn_threshold_ms() -> f64 {
    DEFAULT_WARN_THRESHOLD_MS
}

fn default_shm_name() -> String {
    DEFAULT_SEGMENT_NAME.to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_rt_priority() -> i32 {
    DEFAULT_RT_PRIORITY
}

fn default_lock_memory() -> bool {
    true
}

impl ClientConfig {
    /// Read, parse and validate a config file.
    ///
    /// A relative `robot_client_metadata_path` is resolved against the
    /// directory holding the config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is unreadable, malformed or invalid.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Self = serde_yaml::from_str(&contents)?;
        if config.robot_client_metadata_path.is_relative()
            && let Some(dir) = path.parent()
        {
            config.robot_client_metadata_path = dir.join(&config.robot_client_metadata_path);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate YAML text. Paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the text is malformed or invalid.
    pub fn from_yaml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.num_dofs == 0 {
            return Err(invalid("num_dofs must be greater than zero"));
        }
        if self.window_size == 0 {
            return Err(invalid("window_size must be greater than zero"));
        }
        if !(self.period_ms.is_finite() && self.period_ms > 0.0) {
            return Err(invalid("period_ms must be a positive number"));
        }
        if !(self.warn_threshold_ms.is_finite() && self.warn_threshold_ms >= 0.0) {
            return Err(invalid("warn_threshold_ms must be a non-negative number"));
        }
        if self.server_address.trim().is_empty() {
            return Err(invalid("server_address must not be empty"));
        }
        if !(1..=99).contains(&self.rt_priority) {
            return Err(invalid("rt_priority must be between 1 and 99"));
        }
        if self.cpu_affinity == Some(0) {
            return Err(invalid("cpu_affinity must select at least one CPU"));
        }
        Ok(())
    }

    /// Server address as a URI, with `http://` added when no scheme is given.
    pub fn endpoint_uri(&self) -> String {
        normalize_address(&self.server_address)
    }

    /// Loop period.
    pub fn period(&self) -> Duration {
        Duration::try_from_secs_f64(self.period_ms / 1000.0)
            .unwrap_or(Duration::from_millis(1))
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Driver settings derived from this config.
    pub fn loop_config(&self) -> LoopConfig {
        LoopConfig {
            num_requests: self.num_requests,
            period: self.period(),
            window_size: self.window_size,
            warn_threshold_ms: self.warn_threshold_ms,
        }
    }

    /// Thread setup for the loop: real-time when `use_real_time` is set,
    /// plain otherwise.
    pub fn rt_setup(&self) -> RTSetup {
        if !self.use_real_time {
            return RTSetup::minimal();
        }
        let setup = RTSetup::minimal()
            .with_class(SchedulingClass::RealTime {
                priority: self.rt_priority,
            })
            .with_lock_memory(self.lock_memory);
        match self.cpu_affinity {
            Some(mask) => setup.with_cpu_affinity(mask),
            None => setup,
        }
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}
