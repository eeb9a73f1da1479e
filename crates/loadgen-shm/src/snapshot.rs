//! Client-side view of a state segment.
//!
//! A [`SharedSnapshot`] is a non-owning, externally synchronized view: it
//! maps a segment another process created and writes into it with plain
//! volatile stores. No lock or sequence counter guards the regions, so a
//! reader on the other side may observe a frame mid-write. Fine for load
//! generation, not for control.

use std::marker::PhantomData;

use shared_memory::{Shmem, ShmemConf};
use tracing::debug;

use crate::error::{ShmError, ShmResult};
use crate::layout::{
    RegionDescriptor, RegionKind, RegionSpan, SegmentHeader, ShmTimestamp, StateVector,
    TIMESTAMP_REGION, descriptor_size, descriptor_table_offset, locate, validate_header,
};

/// Source of the per-iteration state frame.
pub trait StateFeed {
    /// Stamp the current time and zero every element of every vector.
    fn write_synthetic_frame(&mut self);

    /// Element count of each vector.
    fn num_dofs(&self) -> usize;
}

/// Attached view bound to the timestamp region and the four vector regions.
pub struct SharedSnapshot {
    shmem: Shmem,
    num_dofs: usize,
    timestamp: RegionSpan,
    vectors: [RegionSpan; 4],
}

impl std::fmt::Debug for SharedSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSnapshot")
            .field("os_id", &self.shmem.get_os_id())
            .field("num_dofs", &self.num_dofs)
            .field("timestamp", &self.timestamp)
            .field("vectors", &self.vectors)
            .finish()
    }
}

impl SharedSnapshot {
    /// Attach to an existing segment and bind every region.
    ///
    /// # Errors
    ///
    /// - `ShmError::Open` if no segment named `name` exists
    /// - any layout error if the header, a region, or a region length
    ///   disagrees with `num_dofs`
    pub fn attach(name: &str, num_dofs: usize) -> ShmResult<Self> {
        let shmem = ShmemConf::new()
            .os_id(name)
            .open()
            .map_err(|e| ShmError::Open {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        let snapshot = Self::bind(shmem, num_dofs)?;
        debug!(
            segment = name,
            num_dofs,
            bytes = snapshot.shmem.len(),
            "Attached to shared state segment"
        );
        Ok(snapshot)
    }

    /// Validate the mapping's layout and resolve region spans.
    pub(crate) fn bind(shmem: Shmem, num_dofs: usize) -> ShmResult<Self> {
        let size = shmem.len();
        let base = shmem.as_ptr().cast_const();

        if size < descriptor_table_offset() {
            return Err(ShmError::TooSmall {
                required: descriptor_table_offset(),
                actual: size,
            });
        }
        // SAFETY: the mapping is page aligned and at least header-sized.
        let header = unsafe { base.cast::<SegmentHeader>().read_volatile() };
        validate_header(&header, num_dofs)?;

        let count = header.region_count as usize;
        let table_end = descriptor_table_offset() + count * descriptor_size();
        if size < table_end {
            return Err(ShmError::TooSmall {
                required: table_end,
                actual: size,
            });
        }

        let descriptors: Vec<RegionDescriptor> = (0..count)
            .map(|i| {
                let entry = base
                    .wrapping_add(descriptor_table_offset() + i * descriptor_size())
                    .cast::<RegionDescriptor>();
                // SAFETY: entry lies inside the mapping (checked against table_end)
                // and is 8-byte aligned since header and entry sizes are multiples of 8.
                unsafe { entry.read_volatile() }
            })
            .collect();

        let timestamp = locate(&descriptors, TIMESTAMP_REGION, RegionKind::Timestamp, 1, size)?;
        let mut vectors = [RegionSpan::default(); 4];
        for (span, vector) in vectors.iter_mut().zip(StateVector::ALL) {
            *span = locate(
                &descriptors,
                vector.region_name(),
                RegionKind::F32Vector,
                num_dofs,
                size,
            )?;
        }

        Ok(Self {
            shmem,
            num_dofs,
            timestamp,
            vectors,
        })
    }

    /// OS identifier of the mapped segment.
    pub fn os_id(&self) -> &str {
        self.shmem.get_os_id()
    }

    /// Element count of each vector.
    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    /// Read the timestamp region.
    pub fn timestamp(&self) -> ShmTimestamp {
        let ptr = self
            .shmem
            .as_ptr()
            .wrapping_add(self.timestamp.offset)
            .cast::<ShmTimestamp>();
        // SAFETY: span was bounds and alignment checked at bind.
        unsafe { ptr.read_volatile() }
    }

    /// Overwrite the timestamp region.
    pub fn set_timestamp(&mut self, timestamp: ShmTimestamp) {
        let ptr = self
            .shmem
            .as_ptr()
            .wrapping_add(self.timestamp.offset)
            .cast::<ShmTimestamp>();
        // SAFETY: span was bounds and alignment checked at bind.
        unsafe { ptr.write_volatile(timestamp) };
    }

    /// Mutable view of one vector region.
    pub fn vector(&mut self, which: StateVector) -> VectorRegion<'_> {
        let span = self.span(which);
        VectorRegion {
            ptr: self.shmem.as_ptr().wrapping_add(span.offset).cast::<f32>(),
            len: span.len,
            _segment: PhantomData,
        }
    }

    /// Copy one vector region out of the segment.
    pub fn read_vector(&self, which: StateVector) -> Vec<f32> {
        let span = self.span(which);
        let base = self.shmem.as_ptr().wrapping_add(span.offset).cast::<f32>();
        (0..span.len)
            .map(|i| {
                // SAFETY: i < span.len and the span was bounds checked at bind.
                unsafe { base.wrapping_add(i).read_volatile() }
            })
            .collect()
    }

    fn span(&self, which: StateVector) -> RegionSpan {
        self.vectors
            .get(which.index())
            .copied()
            .unwrap_or_default()
    }
}

impl StateFeed for SharedSnapshot {
    fn write_synthetic_frame(&mut self) {
        self.set_timestamp(ShmTimestamp::now());
        for which in StateVector::ALL {
            self.vector(which).fill(0.0);
        }
    }

    fn num_dofs(&self) -> usize {
        self.num_dofs
    }
}

/// Mutable, bounds-checked view of one `f32` vector region.
#[derive(Debug)]
pub struct VectorRegion<'a> {
    ptr: *mut f32,
    len: usize,
    _segment: PhantomData<&'a mut [f32]>,
}

impl VectorRegion<'_> {
    /// Element count.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the region holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read one element.
    pub fn get(&self, index: usize) -> Option<f32> {
        if index >= self.len {
            return None;
        }
        // SAFETY: index < len and the region was bounds checked at bind.
        Some(unsafe { self.ptr.wrapping_add(index).read_volatile() })
    }

    /// Write every element.
    pub fn fill(&mut self, value: f32) {
        for i in 0..self.len {
            // SAFETY: i < len and the region was bounds checked at bind.
            unsafe { self.ptr.wrapping_add(i).write_volatile(value) };
        }
    }

    /// Write `values` from the first element; extra values are ignored.
    pub fn copy_from(&mut self, values: &[f32]) {
        for (i, &value) in values.iter().take(self.len).enumerate() {
            // SAFETY: i < len and the region was bounds checked at bind.
            unsafe { self.ptr.wrapping_add(i).write_volatile(value) };
        }
    }
}
