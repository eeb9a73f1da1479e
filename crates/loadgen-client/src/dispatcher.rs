//! Blocking gRPC client for the controller service.
//!
//! The load loop is synchronous, so [`GrpcDispatcher`] owns a current-thread
//! tokio runtime and drives each call to completion with `block_on`.

use std::time::Duration;

use loadgen_schemas::prelude::{
    PolymetisControllerServerClient, RobotClientMetadata, RobotState, TorqueCommand,
};
use tokio::runtime::{Builder, Runtime};
use tonic::Request;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

use crate::error::{DispatchError, DispatchResult};

/// Remote side of the control loop.
pub trait ControlEndpoint {
    /// Send robot metadata once before the first control update.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if the call fails or is rejected.
    fn initialize(&mut self, metadata: RobotClientMetadata) -> DispatchResult<()>;

    /// Send one state and wait for the command.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError` if the call fails or is rejected.
    fn send(&mut self, state: RobotState) -> DispatchResult<TorqueCommand>;
}

/// Prefix `http://` when `address` carries no URI scheme.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// gRPC implementation of [`ControlEndpoint`].
#[derive(Debug)]
pub struct GrpcDispatcher {
    runtime: Runtime,
    client: PolymetisControllerServerClient<Channel>,
}

impl GrpcDispatcher {
    /// Connect to `address`, waiting at most `connect_timeout`.
    ///
    /// # Errors
    ///
    /// - `DispatchError::Runtime` if the runtime cannot be built
    /// - `DispatchError::InvalidAddress` if `address` is not a URI
    /// - `DispatchError::Connect` if the server is unreachable
    pub fn connect(address: &str, connect_timeout: Duration) -> DispatchResult<Self> {
        let address = normalize_address(address);
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DispatchError::Runtime)?;

        let endpoint = Endpoint::from_shared(address.clone())
            .map_err(|e| DispatchError::InvalidAddress {
                address: address.clone(),
                reason: e.to_string(),
            })?
            .connect_timeout(connect_timeout);

        debug!(%address, ?connect_timeout, "Connecting to controller");
        let channel = runtime
            .block_on(endpoint.connect())
            .map_err(|e| DispatchError::Connect {
                address: address.clone(),
                reason: e.to_string(),
            })?;
        info!(%address, "Connected to controller");

        Ok(Self {
            runtime,
            client: PolymetisControllerServerClient::new(channel),
        })
    }
}

impl ControlEndpoint for GrpcDispatcher {
    fn initialize(&mut self, metadata: RobotClientMetadata) -> DispatchResult<()> {
        self.runtime
            .block_on(self.client.init_robot_client(Request::new(metadata)))?;
        Ok(())
    }

    fn send(&mut self, state: RobotState) -> DispatchResult<TorqueCommand> {
        let response = self
            .runtime
            .block_on(self.client.control_update(Request::new(state)))?;
        Ok(response.into_inner())
    }
}
