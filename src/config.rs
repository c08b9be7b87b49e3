use std::sync::OnceLock;

use tracing::debug;

use crate::error::AllocError;

/// Descriptor for one pool in a chain: how wide each block is and how many
/// of them the pool holds. The position of a descriptor in the configuration
/// list is the pool's search priority; the chain never reorders, so callers
/// normally list the smallest block size first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpec {
    /// Bytes per block. Must be positive.
    pub block_size: usize,
    /// Total blocks in the pool. Must be positive.
    pub block_count: usize,
}

impl PoolSpec {
    pub const fn new(block_size: usize, block_count: usize) -> Self {
        Self {
            block_size,
            block_count,
        }
    }
}

/// Rejects an empty list and any descriptor with a zero field or an extent
/// that overflows. Shared by chain construction and the default
/// configuration so both fail the same way.
pub(crate) fn validate(specs: &[PoolSpec]) -> Result<(), AllocError> {
    if specs.is_empty() {
        return Err(AllocError::EmptyConfig);
    }

    for (index, spec) in specs.iter().enumerate() {
        let extent = spec.block_size.checked_mul(spec.block_count);

        if spec.block_size == 0 || spec.block_count == 0 || extent.is_none() {
            return Err(AllocError::InvalidSpec { index });
        }
    }

    Ok(())
}

static DEFAULT_CONFIG: OnceLock<Vec<PoolSpec>> = OnceLock::new();

/// Installs the process-wide default pool layout consumed by
/// [`crate::PoolAllocator::from_default_config`].
///
/// Set-once state: the first call wins and every later call fails with
/// [`AllocError::ConfigAlreadySet`]. Must run before the first
/// default-constructed allocator; consuming the configuration while unset
/// fails with [`AllocError::ConfigUnset`] rather than silently operating on
/// an empty layout.
pub fn set_default_config(specs: &[PoolSpec]) -> Result<(), AllocError> {
    validate(specs)?;

    DEFAULT_CONFIG
        .set(specs.to_vec())
        .map_err(|_| AllocError::ConfigAlreadySet)?;

    debug!(pools = specs.len(), "default pool configuration installed");

    Ok(())
}

/// The installed default layout.
pub(crate) fn default_config() -> Result<&'static [PoolSpec], AllocError> {
    DEFAULT_CONFIG
        .get()
        .map(Vec::as_slice)
        .ok_or(AllocError::ConfigUnset)
}
