//! Owning side of a state segment.

use shared_memory::ShmemConf;
use tracing::info;

use crate::error::{ShmError, ShmResult};
use crate::layout::{RegionDescriptor, SegmentHeader, SegmentLayout, descriptor_size, descriptor_table_offset};
use crate::snapshot::SharedSnapshot;

/// A state segment created and owned by this process.
///
/// The control server publishes the segment that clients attach to; this type
/// is that side. The segment is unlinked when the value is dropped.
#[derive(Debug)]
pub struct SharedStateSegment {
    snapshot: SharedSnapshot,
}

impl SharedStateSegment {
    /// Create a zero-filled segment named `name` laid out for `num_dofs`.
    ///
    /// # Errors
    ///
    /// - `ShmError::InvalidDofs` if `num_dofs` is zero
    /// - `ShmError::Create` if the name is taken or mapping fails
    pub fn create(name: &str, num_dofs: usize) -> ShmResult<Self> {
        let layout = SegmentLayout::for_dofs(num_dofs)?;
        let shmem = ShmemConf::new()
            .size(layout.total_size())
            .os_id(name)
            .create()
            .map_err(|e| ShmError::Create {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        if shmem.len() < layout.total_size() {
            return Err(ShmError::TooSmall {
                required: layout.total_size(),
                actual: shmem.len(),
            });
        }

        let base = shmem.as_ptr();
        // SAFETY: the mapping is page aligned and holds the whole layout.
        unsafe { base.cast::<SegmentHeader>().write_volatile(layout.header()) };
        for (i, descriptor) in layout.descriptors().iter().enumerate() {
            let entry = base
                .wrapping_add(descriptor_table_offset() + i * descriptor_size())
                .cast::<RegionDescriptor>();
            // SAFETY: entry lies within the table the layout sized the mapping for.
            unsafe { entry.write_volatile(*descriptor) };
        }

        let snapshot = SharedSnapshot::bind(shmem, num_dofs)?;
        info!(
            segment = name,
            num_dofs,
            bytes = layout.total_size(),
            "Created shared state segment"
        );
        Ok(Self { snapshot })
    }

    /// OS identifier clients attach with.
    pub fn os_id(&self) -> &str {
        self.snapshot.os_id()
    }

    /// View of the segment's regions.
    pub fn snapshot(&self) -> &SharedSnapshot {
        &self.snapshot
    }

    /// Mutable view of the segment's regions.
    pub fn snapshot_mut(&mut self) -> &mut SharedSnapshot {
        &mut self.snapshot
    }
}
