//! Fixed-layout, segregated-size memory pool allocator.
//!
//! A set of pre-allocated memory regions ("pools"), each divided into
//! equal-sized blocks, chained together so that one allocator front-end can
//! serve requests of varying sizes by routing them to the smallest-fitting
//! pool with room left:
//!
//! ```text
//!               PoolAllocator<T>
//!                      |
//!                      |  n * size_of::<T>() bytes
//!                      v
//!                  PoolChain
//!         +------------+------------+
//!         |            |            |
//!         v            v            v
//!     +--------+   +--------+   +--------+
//!     |  Pool  |   |  Pool  |   |  Pool  |     tried in configured order,
//!     | 8B x 64|   |64B x 16|   |4KB x 4 |     falling through on failure
//!     +--------+   +--------+   +--------+
//! ```
//!
//! Each pool owns one contiguous mapping obtained straight from the
//! operating system, plus a one-bit-per-block occupancy bitmap. Allocation
//! rounds the byte count up to whole blocks and takes the lowest-indexed
//! contiguous run of free blocks; a pool whose free blocks are too
//! fragmented for the run simply passes the request down the chain.
//!
//! Pools are created once, at chain construction, from an ordered list of
//! [`PoolSpec`] descriptors, and are never resized, reordered, coalesced or
//! compacted. The engine is single-threaded by design: nothing in here
//! locks, so a chain shared between threads must be synchronized by the
//! caller.
//!
//! ```no_run
//! use poolalloc::{PoolAllocator, PoolSpec};
//!
//! let mut numbers = PoolAllocator::<u64>::with_pools(&[
//!     PoolSpec::new(8, 64),
//!     PoolSpec::new(64, 16),
//! ])?;
//!
//! let values = numbers.allocate(4)?;
//! // ... use the four u64 slots ...
//! numbers.deallocate(values.as_ptr(), 4)?;
//! # Ok::<(), poolalloc::AllocError>(())
//! ```

mod bitmap;
mod chain;
mod config;
mod error;
mod platform;
mod pool;
mod region;
mod utils;

pub use chain::PoolChain;
pub use config::{PoolSpec, set_default_config};
pub use error::AllocError;
pub use pool::Pool;

use std::{marker::PhantomData, ptr::NonNull};

/// Typed front-end over a [`PoolChain`].
///
/// Translates element counts of `T` into byte requests and delegates to its
/// chain; it keeps no per-allocation state of its own. Each allocator owns
/// its chain outright — two allocators built from the same configuration
/// share the layout, never the underlying memory.
pub struct PoolAllocator<T> {
    chain: PoolChain,
    _marker: PhantomData<T>,
}

impl<T> PoolAllocator<T> {
    /// Explicit construction mode: a privately owned chain built from
    /// `specs`, in the given search order.
    pub fn with_pools(specs: &[PoolSpec]) -> Result<Self, AllocError> {
        Ok(Self {
            chain: PoolChain::new(specs)?,
            _marker: PhantomData,
        })
    }

    /// Default construction mode: builds an independent chain from the
    /// process-wide layout installed by [`set_default_config`]. Fails with
    /// [`AllocError::ConfigUnset`] when that hasn't happened yet.
    pub fn from_default_config() -> Result<Self, AllocError> {
        Self::with_pools(config::default_config()?)
    }

    /// Space for `n` values of `T`. The result is the chain's address
    /// reinterpreted as `*mut T`; zero elements (and zero-sized `T`) hit
    /// the chain's zero-size policy.
    pub fn allocate(&mut self, n: usize) -> Result<NonNull<T>, AllocError> {
        // An overflowing byte count can never fit anyway; saturate and let
        // the chain report exhaustion.
        let bytes = n.saturating_mul(size_of::<T>());

        self.chain.allocate(bytes).map(NonNull::cast)
    }

    /// Releases `n` values of `T` previously allocated at `ptr` by this
    /// allocator's chain.
    pub fn deallocate(&mut self, ptr: *mut T, n: usize) -> Result<(), AllocError> {
        self.chain
            .deallocate(ptr.cast(), n.saturating_mul(size_of::<T>()))
    }

    /// The underlying chain, for introspection.
    pub fn chain(&self) -> &PoolChain {
        &self.chain
    }
}
