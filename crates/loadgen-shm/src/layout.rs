//! On-segment layout: header, region descriptor table, and payload placement.
//!
//! ```text
//! +----------------+  offset 0
//! | SegmentHeader  |  16 bytes
//! +----------------+
//! | descriptor[0]  |  56 bytes each
//! | ...            |
//! +----------------+  8-byte aligned
//! | payloads       |  one per descriptor, 8-byte aligned
//! +----------------+
//! ```

use std::mem::size_of;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{ShmError, ShmResult};

/// Magic value identifying a state segment (`"RSHM"` little-endian).
pub const SEGMENT_MAGIC: u32 = 0x4D48_5352;

/// Layout version written by [`SegmentLayout::header`].
pub const SEGMENT_VERSION: u32 = 1;

/// Fixed size of a region name, NUL padded.
pub const REGION_NAME_LEN: usize = 32;

/// Upper bound on descriptor table entries accepted at attach.
pub const MAX_REGIONS: u32 = 64;

/// Segment name the control server publishes by default.
pub const DEFAULT_SEGMENT_NAME: &str = "RobotStateSharedMemory";

/// Timestamp region name.
pub const TIMESTAMP_REGION: &str = "shm_timestamp";

const PAYLOAD_ALIGN: usize = 8;

/// The four per-joint vectors carried in a state segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVector {
    /// Measured joint positions.
    JointPositions,
    /// Measured joint velocities.
    JointVelocities,
    /// Measured joint torques.
    JointTorquesMeasured,
    /// Estimated external joint torques.
    JointTorquesExternal,
}

impl StateVector {
    /// All vectors in descriptor table order.
    pub const ALL: [StateVector; 4] = [
        StateVector::JointPositions,
        StateVector::JointVelocities,
        StateVector::JointTorquesMeasured,
        StateVector::JointTorquesExternal,
    ];

    /// Region name used in the descriptor table.
    pub const fn region_name(self) -> &'static str {
        match self {
            StateVector::JointPositions => "joint_positions",
            StateVector::JointVelocities => "joint_velocities",
            StateVector::JointTorquesMeasured => "joint_torques_measured",
            StateVector::JointTorquesExternal => "joint_torques_external",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            StateVector::JointPositions => 0,
            StateVector::JointVelocities => 1,
            StateVector::JointTorquesMeasured => 2,
            StateVector::JointTorquesExternal => 3,
        }
    }
}

/// Segment header at offset 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentHeader {
    /// Must equal [`SEGMENT_MAGIC`].
    pub magic: u32,
    /// Layout version.
    pub version: u32,
    /// Element count of every vector region.
    pub num_dofs: u32,
    /// Number of descriptors following the header.
    pub region_count: u32,
}

/// Element type stored in a region.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// A single [`ShmTimestamp`].
    Timestamp = 1,
    /// A packed array of `f32`.
    F32Vector = 2,
}

impl RegionKind {
    /// Decode a raw descriptor tag.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(RegionKind::Timestamp),
            2 => Some(RegionKind::F32Vector),
            _ => None,
        }
    }

    /// Size in bytes of one element of this kind.
    pub const fn element_size(self) -> usize {
        match self {
            RegionKind::Timestamp => size_of::<ShmTimestamp>(),
            RegionKind::F32Vector => size_of::<f32>(),
        }
    }
}

/// Descriptor table entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDescriptor {
    /// NUL-padded UTF-8 name.
    pub name: [u8; REGION_NAME_LEN],
    /// Raw [`RegionKind`] tag.
    pub kind: u32,
    /// Reserved, zero.
    pub reserved: u32,
    /// Byte offset of the payload from the start of the segment.
    pub offset: u64,
    /// Number of elements in the payload.
    pub len: u64,
}

impl RegionDescriptor {
    /// Build a descriptor. Names longer than 31 bytes are truncated.
    pub fn new(name: &str, kind: RegionKind, offset: usize, len: usize) -> Self {
        let mut encoded = [0u8; REGION_NAME_LEN];
        for (dst, src) in encoded
            .iter_mut()
            .take(REGION_NAME_LEN - 1)
            .zip(name.bytes())
        {
            *dst = src;
        }
        Self {
            name: encoded,
            kind: kind as u32,
            reserved: 0,
            offset: offset as u64,
            len: len as u64,
        }
    }

    /// Decoded name, up to the first NUL.
    pub fn name(&self) -> &str {
        let end = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(REGION_NAME_LEN);
        self.name
            .get(..end)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("")
    }
}

/// Wall-clock timestamp stored in the timestamp region.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShmTimestamp {
    /// Seconds since the Unix epoch.
    pub seconds: i64,
    /// Nanoseconds within the second.
    pub nanos: i32,
}

impl ShmTimestamp {
    /// Current wall-clock time. Clocks set before the epoch read as zero.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert a `SystemTime`.
    pub fn from_system_time(time: SystemTime) -> Self {
        let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
        Self {
            seconds: i64::try_from(since_epoch.as_secs()).unwrap_or(i64::MAX),
            nanos: i32::try_from(since_epoch.subsec_nanos()).unwrap_or(0),
        }
    }

    /// Check if this timestamp was never written.
    pub fn is_zero(&self) -> bool {
        self.seconds == 0 && self.nanos == 0
    }
}

/// Byte offset and element count of a located region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionSpan {
    /// Byte offset from the start of the segment.
    pub offset: usize,
    /// Element count.
    pub len: usize,
}

/// Full layout of a state segment for a given DOF count.
#[derive(Debug, Clone)]
pub struct SegmentLayout {
    num_dofs: u32,
    descriptors: Vec<RegionDescriptor>,
    total_size: usize,
}

impl SegmentLayout {
    /// Lay out the timestamp region followed by the four vector regions.
    ///
    /// # Errors
    ///
    /// Returns `ShmError::InvalidDofs` for zero or a count that overflows
    /// the header field.
    pub fn for_dofs(num_dofs: usize) -> ShmResult<Self> {
        let header_dofs = u32::try_from(num_dofs)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(ShmError::InvalidDofs(num_dofs))?;

        let region_count = 1 + StateVector::ALL.len();
        let mut cursor = align_up(descriptor_table_offset() + region_count * descriptor_size());

        let mut descriptors = Vec::with_capacity(region_count);
        descriptors.push(RegionDescriptor::new(
            TIMESTAMP_REGION,
            RegionKind::Timestamp,
            cursor,
            1,
        ));
        cursor = align_up(cursor + RegionKind::Timestamp.element_size());

        for vector in StateVector::ALL {
            descriptors.push(RegionDescriptor::new(
                vector.region_name(),
                RegionKind::F32Vector,
                cursor,
                num_dofs,
            ));
            cursor = align_up(cursor + num_dofs * RegionKind::F32Vector.element_size());
        }

        Ok(Self {
            num_dofs: header_dofs,
            descriptors,
            total_size: cursor,
        })
    }

    /// Header describing this layout.
    pub fn header(&self) -> SegmentHeader {
        SegmentHeader {
            magic: SEGMENT_MAGIC,
            version: SEGMENT_VERSION,
            num_dofs: self.num_dofs,
            region_count: self.descriptors.len() as u32,
        }
    }

    /// Descriptor table in on-segment order.
    pub fn descriptors(&self) -> &[RegionDescriptor] {
        &self.descriptors
    }

    /// Bytes needed to hold the whole segment.
    pub fn total_size(&self) -> usize {
        self.total_size
    }
}

/// Byte offset of the first descriptor.
pub(crate) const fn descriptor_table_offset() -> usize {
    size_of::<SegmentHeader>()
}

/// Size of one descriptor table entry.
pub(crate) const fn descriptor_size() -> usize {
    size_of::<RegionDescriptor>()
}

const fn align_up(value: usize) -> usize {
    value.next_multiple_of(PAYLOAD_ALIGN)
}

/// Check a header read from a mapping against the configured DOF count.
pub(crate) fn validate_header(header: &SegmentHeader, num_dofs: usize) -> ShmResult<()> {
    if header.magic != SEGMENT_MAGIC {
        return Err(ShmError::BadMagic {
            found: header.magic,
        });
    }
    if header.version != SEGMENT_VERSION {
        return Err(ShmError::UnsupportedVersion {
            expected: SEGMENT_VERSION,
            found: header.version,
        });
    }
    if header.region_count > MAX_REGIONS {
        return Err(ShmError::TooManyRegions(header.region_count));
    }
    if header.num_dofs as usize != num_dofs {
        return Err(ShmError::DofMismatch {
            region: "header",
            expected: num_dofs,
            found: header.num_dofs as usize,
        });
    }
    Ok(())
}

/// Find `name` in the descriptor table and check kind, length and bounds.
pub(crate) fn locate(
    descriptors: &[RegionDescriptor],
    name: &'static str,
    kind: RegionKind,
    expected_len: usize,
    segment_size: usize,
) -> ShmResult<RegionSpan> {
    let descriptor = descriptors
        .iter()
        .find(|d| d.name() == name)
        .ok_or(ShmError::MissingRegion(name))?;

    if RegionKind::from_raw(descriptor.kind) != Some(kind) {
        return Err(ShmError::KindMismatch {
            region: name,
            expected: kind,
            found: descriptor.kind,
        });
    }

    let len = usize::try_from(descriptor.len).unwrap_or(usize::MAX);
    if len != expected_len {
        return Err(ShmError::DofMismatch {
            region: name,
            expected: expected_len,
            found: len,
        });
    }

    let offset = usize::try_from(descriptor.offset).ok();
    let end = offset.and_then(|offset| {
        len.checked_mul(kind.element_size())
            .and_then(|bytes| offset.checked_add(bytes))
    });
    match (offset, end) {
        (Some(offset), Some(end)) if end <= segment_size && offset % PAYLOAD_ALIGN == 0 => {
            Ok(RegionSpan { offset, len })
        }
        _ => Err(ShmError::OutOfBounds { region: name }),
    }
}
