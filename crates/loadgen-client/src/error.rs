//! Error types for the load generator client

use std::io;
use std::path::PathBuf;

use loadgen_scheduler::RTError;
use loadgen_shm::ShmError;
use thiserror::Error;

use crate::driver::LoopState;

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Config file is not valid YAML for [`ClientConfig`](crate::ClientConfig)
    #[error("Failed to parse config")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Remote call error
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Async runtime backing the blocking client could not start
    #[error("Failed to start client runtime")]
    Runtime(#[source] io::Error),

    /// Server address is not a valid URI
    #[error("Invalid server address '{address}': {reason}")]
    InvalidAddress {
        /// Address as configured
        address: String,
        /// Parser message
        reason: String,
    },

    /// Channel could not be established
    #[error("Connection to {address} failed: {reason}")]
    Connect {
        /// Endpoint URI
        address: String,
        /// Transport message
        reason: String,
    },

    /// Server answered with a non-OK status
    #[error("Request rejected with {code:?}: {message}")]
    Rejected {
        /// gRPC status code
        code: tonic::Code,
        /// Status message
        message: String,
    },
}

impl From<tonic::Status> for DispatchError {
    fn from(status: tonic::Status) -> Self {
        DispatchError::Rejected {
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}

impl DispatchError {
    /// Check if the endpoint was never reached
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidAddress { .. } | DispatchError::Connect { .. }
        )
    }
}

/// Robot client metadata loading error
#[derive(Debug, Error)]
pub enum MetadataError {
    /// File could not be read
    #[error("Failed to read metadata file")]
    Io(#[from] io::Error),

    /// File does not hold a serialized `RobotClientMetadata`
    #[error("Failed to decode robot client metadata")]
    Decode(#[from] prost::DecodeError),
}

/// Error ending a load generation run
#[derive(Debug, Error)]
pub enum LoopError {
    /// Configuration is missing or invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Metadata file could not be loaded
    #[error("Failed to load robot client metadata from {path}")]
    Metadata {
        /// Metadata file path
        path: PathBuf,
        /// Cause
        #[source]
        source: MetadataError,
    },

    /// Connection or initialization call failed
    #[error("Handshake failed")]
    Handshake(#[source] DispatchError),

    /// Shared state segment could not be attached
    #[error("Failed to attach shared state")]
    Attach(#[from] ShmError),

    /// A per-iteration call failed
    #[error("Control update failed at iteration {iteration}")]
    Dispatch {
        /// Zero-based iteration index of the failed call
        iteration: u64,
        /// Cause
        #[source]
        source: DispatchError,
    },

    /// Sleeping to the next period boundary failed
    #[error("Pacing failed")]
    Pacing(#[from] RTError),

    /// Operation called out of order
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// State the driver was in
        state: LoopState,
    },
}

impl LoopError {
    /// Check if this error stops the run before any iteration executes
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            LoopError::Config(_)
                | LoopError::Metadata { .. }
                | LoopError::Handshake(_)
                | LoopError::Attach(_)
        )
    }
}

/// Result type for configuration loading
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type for remote calls
pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

/// Result type for a load generation run
pub type LoopResult<T> = std::result::Result<T, LoopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_rejected() {
        let err = DispatchError::from(tonic::Status::unavailable("controller stopped"));
        match &err {
            DispatchError::Rejected { code, message } => {
                assert_eq!(*code, tonic::Code::Unavailable);
                assert_eq!(message, "controller stopped");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_startup_classification() {
        let handshake = LoopError::Handshake(DispatchError::Connect {
            address: "http://localhost:50051".to_string(),
            reason: "refused".to_string(),
        });
        assert!(handshake.is_fatal_at_startup());

        let attach = LoopError::Attach(ShmError::MissingRegion("joint_positions"));
        assert!(attach.is_fatal_at_startup());

        let dispatch = LoopError::Dispatch {
            iteration: 4999,
            source: DispatchError::from(tonic::Status::internal("boom")),
        };
        assert!(!dispatch.is_fatal_at_startup());
        assert!(!LoopError::Pacing(RTError::TimingViolation).is_fatal_at_startup());
    }

    #[test]
    fn test_dispatch_error_display() {
        let err = LoopError::Dispatch {
            iteration: 4999,
            source: DispatchError::from(tonic::Status::internal("boom")),
        };
        assert_eq!(err.to_string(), "Control update failed at iteration 4999");
        assert_eq!(
            format!("{:#}", anyhow::Error::from(err)),
            "Control update failed at iteration 4999: Request rejected with Internal: boom"
        );
    }

    #[test]
    fn test_chained_display_names_os_error_once() {
        let err = LoopError::Metadata {
            path: PathBuf::from("/nonexistent/metadata.pb"),
            source: MetadataError::Io(io::Error::new(io::ErrorKind::NotFound, "no such file")),
        };
        let chained = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(
            chained,
            "Failed to load robot client metadata from /nonexistent/metadata.pb: \
             Failed to read metadata file: no such file"
        );
        assert_eq!(chained.matches("no such file").count(), 1);
    }

    #[test]
    fn test_config_read_error_with_context() {
        let err = ConfigError::Read {
            path: PathBuf::from("/nonexistent.yaml"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let chained = format!(
            "{:#}",
            anyhow::Error::from(err).context("Failed to load /nonexistent.yaml")
        );
        assert_eq!(
            chained,
            "Failed to load /nonexistent.yaml: Failed to read config file /nonexistent.yaml: no such file"
        );
    }
}
