//! Prelude module for common client types.

pub use crate::config::ClientConfig;
pub use crate::dispatcher::{ControlEndpoint, GrpcDispatcher};
pub use crate::driver::{LoopConfig, LoopState, PacedLoopDriver, RunSummary};
pub use crate::error::{ConfigError, DispatchError, LoopError, LoopResult};
pub use crate::session::run_session;
