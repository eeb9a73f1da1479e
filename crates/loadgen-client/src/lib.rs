//! Paced gRPC load generator for a robot controller.
//!
//! The client sends one `ControlUpdate` per period, refreshes a shared memory
//! state frame before each call, and reports round-trip latency per window of
//! iterations and across the whole run.
//!
//! # Example
//!
//! ```rust,no_run
//! use loadgen_client::{ClientConfig, run_session};
//! use std::path::Path;
//!
//! let config = ClientConfig::load(Path::new("client.yaml"))?;
//! let summary = run_session(&config)?;
//! println!("{} iterations, {} windows", summary.iterations, summary.windows_folded);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod prelude;
pub mod session;

pub use config::ClientConfig;
pub use dispatcher::{ControlEndpoint, GrpcDispatcher, normalize_address};
pub use driver::{LoopConfig, LoopState, PacedLoopDriver, RunSummary};
pub use error::{
    ConfigError, ConfigResult, DispatchError, DispatchResult, LoopError, LoopResult,
    MetadataError,
};
pub use metadata::load_metadata;
pub use session::run_session;
