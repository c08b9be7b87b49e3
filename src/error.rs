use thiserror::Error;

/// Everything that can go wrong across the allocator's layers.
///
/// Pool-level "no fit found" is not an error: a [`crate::Pool`] signals it
/// with `None` and the owning chain simply tries the next pool. Only the
/// conditions below ever reach the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// No pool in the chain holds a long enough run of free blocks.
    #[error("no pool can satisfy a request of {requested} bytes")]
    Exhausted { requested: usize },

    /// Zero-byte (and zero-element) requests are rejected outright instead
    /// of being rounded through the block-count arithmetic.
    #[error("zero-sized allocation requests are not supported")]
    ZeroSize,

    /// Deallocation was asked to release a null address.
    #[error("deallocation of a null address")]
    NullRelease,

    /// Deallocation was asked to release an address no pool in the chain
    /// owns. Reported rather than ignored, since it always means the caller
    /// mixed up allocators.
    #[error("address {addr:#x} is not owned by any pool in this chain")]
    UnownedRelease { addr: usize },

    /// A chain needs at least one pool descriptor.
    #[error("pool configuration must contain at least one descriptor")]
    EmptyConfig,

    /// A descriptor has a zero block size, a zero block count, or an extent
    /// that overflows `usize`.
    #[error("pool descriptor {index} is invalid")]
    InvalidSpec { index: usize },

    /// A default-constructed allocator was requested before
    /// [`crate::set_default_config`] ran.
    #[error("default pool configuration consumed before being set")]
    ConfigUnset,

    /// [`crate::set_default_config`] was called a second time.
    #[error("default pool configuration was already set")]
    ConfigAlreadySet,

    /// The platform refused to map a region of the given length.
    #[error("platform refused a mapping of {len} bytes")]
    MapFailed { len: usize },
}
