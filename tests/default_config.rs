//! The process-wide default configuration is set-once state, so its whole
//! lifecycle runs inside a single test function in its own binary. The rest
//! of the suite sticks to explicitly constructed chains and stays out of
//! this file's way.

use poolalloc::{AllocError, PoolAllocator, PoolSpec, set_default_config};

#[test]
fn default_config_lifecycle() {
    // Consuming the configuration before it is set fails loudly.
    assert!(matches!(
        PoolAllocator::<u32>::from_default_config(),
        Err(AllocError::ConfigUnset)
    ));

    // Invalid layouts never make it into the global slot.
    assert_eq!(
        set_default_config(&[PoolSpec::new(0, 4)]),
        Err(AllocError::InvalidSpec { index: 0 })
    );
    assert!(matches!(
        PoolAllocator::<u32>::from_default_config(),
        Err(AllocError::ConfigUnset)
    ));

    let specs = [PoolSpec::new(16, 8), PoolSpec::new(128, 4)];
    set_default_config(&specs).unwrap();

    // The slot is set-once; a second install is rejected.
    assert_eq!(set_default_config(&specs), Err(AllocError::ConfigAlreadySet));

    // Default-constructed allocators of any element type share the layout,
    // but each owns an independently constructed chain.
    let mut ints = PoolAllocator::<u32>::from_default_config().unwrap();
    let mut longs = PoolAllocator::<u64>::from_default_config().unwrap();

    assert_eq!(ints.chain().capacity_bytes(), 16 * 8 + 128 * 4);
    assert_eq!(longs.chain().capacity_bytes(), 16 * 8 + 128 * 4);

    let a = ints.allocate(4).unwrap();
    let b = longs.allocate(2).unwrap();

    // Distinct chains, distinct regions: one allocator's pointer is foreign
    // to the other.
    assert_eq!(
        longs.deallocate(a.as_ptr().cast(), 2),
        Err(AllocError::UnownedRelease {
            addr: a.as_ptr() as usize
        })
    );

    ints.deallocate(a.as_ptr(), 4).unwrap();
    longs.deallocate(b.as_ptr(), 2).unwrap();
}
