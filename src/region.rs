use std::ptr::NonNull;

use tracing::debug;

use crate::{
    error::AllocError,
    platform::{Platform, PlatformMemory, page_size},
    utils::align,
};

/// An exclusively-owned memory mapping backing one pool.
///
/// The logical extent is `block_size * block_count` bytes; that is the range
/// [`Region::offset_of`] answers for. The mapping itself is rounded up to a
/// whole number of pages because that's what the kernel hands out either way:
///
/// ```text
///  base                     base + extent      base + mapped
///   v                             v                  v
///   +-----------------------------+------------------+
///   |     blocks (extent bytes)   |   page padding   |
///   +-----------------------------+------------------+
/// ```
///
/// A region never moves or resizes. It is unmapped exactly once, on `Drop`.
pub(crate) struct Region {
    base: NonNull<u8>,
    /// Usable bytes, `block_size * block_count` of the owning pool.
    extent: usize,
    /// Bytes actually mapped; `extent` rounded up to the page size.
    mapped: usize,
}

impl Region {
    /// Maps a fresh region of `extent` usable bytes.
    pub fn new(extent: usize) -> Result<Self, AllocError> {
        let mapped = align(extent, page_size());

        let base = unsafe { Platform::request_memory(mapped) }
            .ok_or(AllocError::MapFailed { len: mapped })?;

        debug!(base = ?base.as_ptr(), extent, mapped, "mapped pool region");

        Ok(Self { base, extent, mapped })
    }

    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Byte offset of `ptr` from the region base, or `None` when `ptr`
    /// falls outside `[base, base + extent)`.
    pub fn offset_of(&self, ptr: NonNull<u8>) -> Option<usize> {
        let addr = ptr.as_ptr() as usize;
        let base = self.base.as_ptr() as usize;

        if addr >= base && addr - base < self.extent {
            Some(addr - base)
        } else {
            None
        }
    }

    /// Pure range-membership predicate over the region descriptor.
    #[inline]
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.offset_of(ptr).is_some()
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { Platform::return_memory(self.base.as_ptr(), self.mapped) };
    }
}
