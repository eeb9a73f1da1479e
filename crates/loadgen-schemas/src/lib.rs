//! Wire schemas for the control-update endpoint.
//!
//! This crate contains the protobuf messages and gRPC stubs shared by the load
//! generator and any server it talks to. The code is generated at build time
//! from `proto/polymetis.proto` with a vendored `protoc`.
//!
//! The load generator treats these messages as opaque payloads: it sends a
//! default [`RobotState`](polymetis::RobotState) every tick and discards the
//! returned [`TorqueCommand`](polymetis::TorqueCommand).

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

pub mod polymetis {
    //! Generated protobuf types and gRPC client/server for the controller service.

    tonic::include_proto!("polymetis");
}

/// Public prelude module for explicit imports
///
/// Consumers must use `loadgen_schemas::prelude::*` explicitly
/// to import commonly used types.
pub mod prelude {
    pub use crate::polymetis::polymetis_controller_server_client::PolymetisControllerServerClient;
    pub use crate::polymetis::polymetis_controller_server_server::{
        PolymetisControllerServer, PolymetisControllerServerServer,
    };
    pub use crate::polymetis::{Empty, RobotClientMetadata, RobotState, TorqueCommand};
}
