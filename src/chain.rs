use std::ptr::NonNull;

use tracing::{debug, trace, warn};

use crate::{
    config::{self, PoolSpec},
    error::AllocError,
    pool::Pool,
};

/// Ordered sequence of [`Pool`]s composed into one allocator.
///
/// Allocation walks the pools in configuration order and takes the first one
/// that can serve the request; deallocation routes to the pool whose region
/// owns the address. The order is fixed at construction and never changes,
/// so the caller's descriptor list doubles as the search priority.
pub struct PoolChain {
    pools: Vec<Pool>,
}

// The chain exclusively owns its pools and their mappings; moving it between
// threads is sound. Shared access still needs external synchronization.
unsafe impl Send for PoolChain {}

impl PoolChain {
    /// Builds one pool per descriptor, linked in list order. Descriptor
    /// validation and region mapping failures propagate; on any failure the
    /// pools built so far are unmapped again.
    pub fn new(specs: &[PoolSpec]) -> Result<Self, AllocError> {
        config::validate(specs)?;

        let mut pools = Vec::with_capacity(specs.len());
        for spec in specs {
            pools.push(Pool::new(spec.block_size, spec.block_count)?);
        }

        debug!(pools = pools.len(), "pool chain ready");

        Ok(Self { pools })
    }

    /// Read-only view of the pools in search order.
    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    /// Total byte capacity across all pools. Not all of it is reachable by
    /// a single allocation; no request ever spans two pools.
    pub fn capacity_bytes(&self) -> usize {
        self.pools
            .iter()
            .map(|pool| pool.block_size() * pool.block_count())
            .sum()
    }

    /// Walks the pools in order until one satisfies the request.
    ///
    /// Per pool this first applies the coarse feasibility test
    /// `free_bytes >= bytes`. Passing it is necessary but not sufficient:
    /// the free blocks may be fragmented, in which case [`Pool::allocate`]
    /// comes back empty and the walk moves on to the next pool instead of
    /// giving up.
    pub fn allocate(&mut self, bytes: usize) -> Result<NonNull<u8>, AllocError> {
        if bytes == 0 {
            return Err(AllocError::ZeroSize);
        }

        for (index, pool) in self.pools.iter_mut().enumerate() {
            if pool.free_bytes() < bytes {
                continue;
            }

            if let Some(ptr) = pool.allocate(bytes) {
                trace!(pool = index, bytes, addr = ?ptr.as_ptr(), "allocated");
                return Ok(ptr);
            }

            trace!(pool = index, bytes, "fragmented, trying the next pool");
        }

        Err(AllocError::Exhausted { requested: bytes })
    }

    /// Routes the release to the pool owning `ptr`.
    ///
    /// A null address is a fatal consistency error. An address no pool owns
    /// is reported as [`AllocError::UnownedRelease`] instead of being
    /// silently dropped, since it always means the caller handed this chain
    /// someone else's pointer.
    pub fn deallocate(&mut self, ptr: *mut u8, bytes: usize) -> Result<(), AllocError> {
        let ptr = NonNull::new(ptr).ok_or(AllocError::NullRelease)?;

        if bytes == 0 {
            return Err(AllocError::ZeroSize);
        }

        for pool in &mut self.pools {
            if pool.contains(ptr) {
                pool.deallocate(ptr, bytes);
                return Ok(());
            }
        }

        warn!(addr = ?ptr.as_ptr(), "release of an address no pool owns");

        Err(AllocError::UnownedRelease {
            addr: ptr.as_ptr() as usize,
        })
    }
}
