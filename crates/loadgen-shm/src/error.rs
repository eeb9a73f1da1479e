//! Error types for shared state segments.

use thiserror::Error;

use crate::layout::RegionKind;

/// Error type for creating, attaching to, and validating a state segment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShmError {
    /// The named segment does not exist or could not be mapped.
    #[error("Failed to open shared memory segment '{name}': {reason}")]
    Open {
        /// OS identifier of the segment.
        name: String,
        /// Reason reported by the mapping layer.
        reason: String,
    },

    /// A new segment could not be created.
    #[error("Failed to create shared memory segment '{name}': {reason}")]
    Create {
        /// OS identifier of the segment.
        name: String,
        /// Reason reported by the mapping layer.
        reason: String,
    },

    /// DOF count is zero or does not fit the header.
    #[error("Invalid DOF count: {0}")]
    InvalidDofs(usize),

    /// Mapping is smaller than the layout requires.
    #[error("Segment is {actual} bytes, layout needs at least {required}")]
    TooSmall {
        /// Bytes required.
        required: usize,
        /// Bytes mapped.
        actual: usize,
    },

    /// Header magic does not identify a state segment.
    #[error("Bad segment magic: {found:#010x}")]
    BadMagic {
        /// Magic value read from the header.
        found: u32,
    },

    /// Header version is not understood.
    #[error("Unsupported segment version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version this crate writes.
        expected: u32,
        /// Version read from the header.
        found: u32,
    },

    /// Region table is larger than any valid layout.
    #[error("Region table holds {0} entries")]
    TooManyRegions(u32),

    /// A required region is absent.
    #[error("Region '{0}' not found in segment")]
    MissingRegion(&'static str),

    /// A region exists with the wrong element type.
    #[error("Region '{region}' has kind {found}, expected {expected:?}")]
    KindMismatch {
        /// Region name.
        region: &'static str,
        /// Kind required for this region.
        expected: RegionKind,
        /// Raw kind tag read from the descriptor.
        found: u32,
    },

    /// A region extends past the mapping or is misaligned.
    #[error("Region '{region}' lies outside the segment")]
    OutOfBounds {
        /// Region name.
        region: &'static str,
    },

    /// A region's element count disagrees with the configured DOF count.
    #[error("Region '{region}' holds {found} values, expected {expected}")]
    DofMismatch {
        /// Region name, or `header` for the header DOF field.
        region: &'static str,
        /// Configured count.
        expected: usize,
        /// Count found in the segment.
        found: usize,
    },
}

impl ShmError {
    /// Check if the segment itself could not be reached, as opposed to being
    /// reachable with an unexpected layout.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ShmError::Open { .. } | ShmError::Create { .. })
    }
}

/// Result type for segment operations.
pub type ShmResult<T> = Result<T, ShmError>;
