//! Prelude module for common shared state types.

pub use crate::error::{ShmError, ShmResult};
pub use crate::layout::{DEFAULT_SEGMENT_NAME, ShmTimestamp, StateVector};
pub use crate::segment::SharedStateSegment;
pub use crate::snapshot::{SharedSnapshot, StateFeed, VectorRegion};
