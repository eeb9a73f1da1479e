//! One complete client run: metadata, handshake, segment attach, loop.

use loadgen_shm::SharedSnapshot;
use tracing::info;

use crate::config::ClientConfig;
use crate::dispatcher::GrpcDispatcher;
use crate::driver::{PacedLoopDriver, RunSummary};
use crate::error::{LoopError, LoopResult};
use crate::metadata::load_metadata;

/// Run the load generator described by `config` on the calling thread.
///
/// Startup order is metadata, connect and handshake, then shared memory
/// attach. No control update is sent until all of them have succeeded.
///
/// # Errors
///
/// Returns the first `LoopError`; see [`LoopError::is_fatal_at_startup`].
pub fn run_session(config: &ClientConfig) -> LoopResult<RunSummary> {
    let metadata = load_metadata(&config.robot_client_metadata_path)?;

    let endpoint = GrpcDispatcher::connect(&config.endpoint_uri(), config.connect_timeout())
        .map_err(LoopError::Handshake)?;
    let mut driver = PacedLoopDriver::new(config.loop_config(), endpoint);
    driver.handshake(metadata)?;

    let mut snapshot = SharedSnapshot::attach(&config.shm_name, config.num_dofs)?;
    info!(
        segment = %config.shm_name,
        num_dofs = config.num_dofs,
        num_requests = config.num_requests,
        "Starting control update loop"
    );

    driver.run(&mut snapshot)
}
