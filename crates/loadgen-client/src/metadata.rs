//! Robot client metadata sent once at handshake.

use std::path::Path;

use loadgen_schemas::prelude::RobotClientMetadata;
use prost::Message;
use tracing::debug;

use crate::error::{LoopError, LoopResult, MetadataError};

/// Read a binary-serialized `RobotClientMetadata` from `path`.
///
/// # Errors
///
/// Returns `LoopError::Metadata` if the file cannot be read or decoded.
pub fn load_metadata(path: &Path) -> LoopResult<RobotClientMetadata> {
    let wrap = |source: MetadataError| LoopError::Metadata {
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::read(path).map_err(|e| wrap(e.into()))?;
    let metadata = RobotClientMetadata::decode(bytes.as_slice()).map_err(|e| wrap(e.into()))?;

    debug!(
        path = %path.display(),
        dof = metadata.dof,
        hz = metadata.hz,
        "Loaded robot client metadata"
    );
    Ok(metadata)
}
