//! Named shared memory segment carrying joint state for a control server.
//!
//! The segment holds one timestamp and four `f32` vectors of length
//! `num_dofs`: `joint_positions`, `joint_velocities`,
//! `joint_torques_measured` and `joint_torques_external`.
//!
//! - [`SharedStateSegment::create`] lays out and owns a segment (server side)
//! - [`SharedSnapshot::attach`] binds to an existing one (client side)
//! - [`StateFeed::write_synthetic_frame`] stamps "now" and zeroes every vector
//!
//! Writes are not synchronized with readers in other processes.
//!
//! # Example
//!
//! ```rust,no_run
//! use loadgen_shm::{DEFAULT_SEGMENT_NAME, SharedSnapshot, StateFeed};
//!
//! let mut snapshot = SharedSnapshot::attach(DEFAULT_SEGMENT_NAME, 7)?;
//! snapshot.write_synthetic_frame();
//! # Ok::<(), loadgen_shm::ShmError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod layout;
pub mod prelude;

#[expect(unsafe_code, reason = "volatile access to the mapped segment")]
pub mod segment;

#[expect(unsafe_code, reason = "volatile access to the mapped segment")]
pub mod snapshot;

pub use error::{ShmError, ShmResult};
pub use layout::{DEFAULT_SEGMENT_NAME, ShmTimestamp, StateVector, TIMESTAMP_REGION};
pub use segment::SharedStateSegment;
pub use snapshot::{SharedSnapshot, StateFeed, VectorRegion};
