use std::ptr::NonNull;

use crate::{bitmap::Bitmap, error::AllocError, region::Region};

/// One contiguous memory region managed at a single block size.
///
/// Every allocation is rounded up to a whole number of blocks and served as
/// the lowest-indexed run of contiguous free blocks, first-fit by starting
/// position:
///
/// ```text
///   blocks:   [####][####][    ][    ][####][    ]
///                           ^
///                           search_cursor
/// ```
///
/// The `search_cursor` is a hint recording the lowest block index that might
/// still be free. It may lag behind the true lowest free index after some
/// deallocation patterns, but it never runs ahead of it, so starting the
/// scan there never skips a usable run.
pub struct Pool {
    block_size: usize,
    block_count: usize,
    free_blocks: usize,
    search_cursor: usize,
    bitmap: Bitmap,
    region: Region,
}

impl Pool {
    /// Maps a region of `block_size * block_count` bytes with every block
    /// free. The owning chain validates the descriptor first.
    pub(crate) fn new(block_size: usize, block_count: usize) -> Result<Self, AllocError> {
        debug_assert!(block_size > 0 && block_count > 0);

        let region = Region::new(block_size * block_count)?;

        Ok(Self {
            block_size,
            block_count,
            free_blocks: block_count,
            search_cursor: 0,
            bitmap: Bitmap::new(block_count),
            region,
        })
    }

    /// Bytes per block, fixed at construction.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Total blocks in the pool, fixed at construction.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Blocks currently unallocated.
    #[inline]
    pub fn free_blocks(&self) -> usize {
        self.free_blocks
    }

    /// Free capacity in bytes. An upper bound on what a single allocation
    /// can get, since the free blocks may not be contiguous.
    #[inline]
    pub fn free_bytes(&self) -> usize {
        self.free_blocks * self.block_size
    }

    /// True iff `ptr` lies inside this pool's region.
    #[inline]
    pub fn contains(&self, ptr: NonNull<u8>) -> bool {
        self.region.contains(ptr)
    }

    /// Blocks needed to hold `bytes`. `None` for a zero-byte request, which
    /// this pool defines as unsatisfiable instead of letting the rounding
    /// arithmetic underflow.
    fn blocks_for(&self, bytes: usize) -> Option<usize> {
        if bytes == 0 {
            return None;
        }

        Some(bytes.div_ceil(self.block_size))
    }

    /// First-fit search for `n` contiguous free blocks, scanning forward
    /// from the cursor one candidate start at a time. A candidate extends
    /// rightward until it is `n` long or hits an in-use block; on a hit the
    /// next candidate starts just past that block.
    fn find_run(&self, n: usize) -> Option<usize> {
        let mut start = self.search_cursor;

        while start + n <= self.block_count {
            match self.bitmap.first_used_in(start, n) {
                None => return Some(start),
                Some(used) => start = used + 1,
            }
        }

        None
    }

    /// Allocates `bytes`, rounded up to whole blocks. Returns `None` when no
    /// run of the required length exists; the pool is left untouched.
    pub fn allocate(&mut self, bytes: usize) -> Option<NonNull<u8>> {
        let n = self.blocks_for(bytes)?;
        let start = self.find_run(n)?;

        self.bitmap.set_run(start, n);
        self.free_blocks -= n;

        // The cursor advances only when the run began exactly at it. A run
        // found further right means the cursor position itself was blocked,
        // and nothing at or before it was freed by this operation, so the
        // hint still lower-bounds the next search.
        if start == self.search_cursor {
            self.search_cursor = start + n;
        }

        // start + n <= block_count, so the whole run is inside the region.
        Some(unsafe {
            NonNull::new_unchecked(self.region.base().as_ptr().add(start * self.block_size))
        })
    }

    /// Releases the `bytes`-sized allocation at `ptr`. The owning chain has
    /// already routed by [`Pool::contains`], so `ptr` is inside this region
    /// and was handed out by [`Pool::allocate`] with the same size.
    pub fn deallocate(&mut self, ptr: NonNull<u8>, bytes: usize) {
        let Some(n) = self.blocks_for(bytes) else {
            return;
        };
        let Some(offset) = self.region.offset_of(ptr) else {
            debug_assert!(false, "release of a pointer outside the pool");
            return;
        };

        let start = offset / self.block_size;

        self.bitmap.clear_run(start, n);
        self.free_blocks += n;

        // A freed run below the cursor re-opens earlier indices.
        if start < self.search_cursor {
            self.search_cursor = start;
        }
    }

    /// Bits currently set in the occupancy bitmap. Exposed so tests can
    /// state the `used + free_blocks == block_count` invariant.
    #[cfg(test)]
    pub(crate) fn used(&self) -> usize {
        self.bitmap.used()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_capacity_invariant(pool: &Pool) {
        assert_eq!(pool.used() + pool.free_blocks(), pool.block_count());
    }

    #[test]
    fn fresh_pool_is_fully_free() {
        let pool = Pool::new(8, 4).unwrap();

        assert_eq!(pool.block_size(), 8);
        assert_eq!(pool.block_count(), 4);
        assert_eq!(pool.free_blocks(), 4);
        assert_eq!(pool.free_bytes(), 32);
        check_capacity_invariant(&pool);
    }

    #[test]
    fn allocations_are_first_fit_from_block_zero() {
        let mut pool = Pool::new(8, 4).unwrap();
        let base = pool.region.base().as_ptr();

        let first = pool.allocate(8).unwrap();
        assert_eq!(first.as_ptr(), base);

        // 9 bytes round up to two blocks, starting right after the first.
        let second = pool.allocate(9).unwrap();
        assert_eq!(second.as_ptr(), unsafe { base.add(8) });

        assert_eq!(pool.free_blocks(), 1);
        check_capacity_invariant(&pool);
    }

    #[test]
    fn allocation_failure_leaves_the_pool_untouched() {
        let mut pool = Pool::new(8, 4).unwrap();
        let _ = pool.allocate(8).unwrap();

        // Five blocks can never fit in a four-block pool.
        assert!(pool.allocate(40).is_none());

        assert_eq!(pool.free_blocks(), 3);
        assert_eq!(pool.search_cursor, 1);
        check_capacity_invariant(&pool);
    }

    #[test]
    fn round_trip_restores_the_free_count_and_bits() {
        let mut pool = Pool::new(16, 8).unwrap();

        let ptr = pool.allocate(40).unwrap(); // 3 blocks
        assert_eq!(pool.free_blocks(), 5);
        assert_eq!(pool.used(), 3);

        pool.deallocate(ptr, 40);

        assert_eq!(pool.free_blocks(), 8);
        assert_eq!(pool.used(), 0);
        check_capacity_invariant(&pool);
    }

    #[test]
    fn live_allocations_never_overlap() {
        let mut pool = Pool::new(8, 16).unwrap();
        let mut runs = Vec::new();

        for bytes in [8, 24, 16, 8, 40] {
            let ptr = pool.allocate(bytes).unwrap();
            let offset = pool.region.offset_of(ptr).unwrap();
            runs.push((offset, offset + bytes.div_ceil(8) * 8));
        }

        for (i, a) in runs.iter().enumerate() {
            for b in &runs[i + 1..] {
                assert!(a.1 <= b.0 || b.1 <= a.0, "runs {a:?} and {b:?} overlap");
            }
        }
        check_capacity_invariant(&pool);
    }

    #[test]
    fn freed_blocks_are_reused_at_the_lowest_index() {
        let mut pool = Pool::new(8, 4).unwrap();
        let base = pool.region.base().as_ptr();

        let first = pool.allocate(8).unwrap();
        let _second = pool.allocate(8).unwrap();

        pool.deallocate(first, 8);
        assert_eq!(pool.search_cursor, 0);

        // 16 bytes won't fit at block 0 alone, but blocks 2..4 are free; the
        // search must skip the hole and land there.
        let third = pool.allocate(16).unwrap();
        assert_eq!(third.as_ptr(), unsafe { base.add(16) });

        // An 8 byte request reuses freed block 0.
        let fourth = pool.allocate(8).unwrap();
        assert_eq!(fourth.as_ptr(), base);
        check_capacity_invariant(&pool);
    }

    #[test]
    fn cursor_is_left_alone_when_the_search_started_elsewhere() {
        let mut pool = Pool::new(8, 8).unwrap();

        let a = pool.allocate(8).unwrap(); // block 0
        let _b = pool.allocate(8).unwrap(); // block 1
        assert_eq!(pool.search_cursor, 2);

        pool.deallocate(a, 8);
        assert_eq!(pool.search_cursor, 0);

        // Two blocks don't fit at the cursor (block 1 is in use), so the
        // run lands at block 2 and the cursor must not move.
        let c = pool.allocate(16).unwrap();
        assert_eq!(pool.region.offset_of(c), Some(16));
        assert_eq!(pool.search_cursor, 0);

        // Block 0 is still reachable through the untouched cursor.
        let d = pool.allocate(8).unwrap();
        assert_eq!(pool.region.offset_of(d), Some(0));
        check_capacity_invariant(&pool);
    }

    #[test]
    fn fragmentation_defeats_a_sufficient_free_count() {
        let mut pool = Pool::new(8, 4).unwrap();

        let a = pool.allocate(8).unwrap(); // block 0
        let _b = pool.allocate(8).unwrap(); // block 1
        let c = pool.allocate(8).unwrap(); // block 2
        let _d = pool.allocate(8).unwrap(); // block 3

        pool.deallocate(a, 8);
        pool.deallocate(c, 8);

        // Two free blocks, but never adjacent.
        assert_eq!(pool.free_blocks(), 2);
        assert!(pool.free_bytes() >= 16);
        assert!(pool.allocate(16).is_none());
        check_capacity_invariant(&pool);
    }

    #[test]
    fn zero_byte_requests_are_a_defined_failure() {
        let mut pool = Pool::new(8, 4).unwrap();

        assert!(pool.allocate(0).is_none());
        assert_eq!(pool.free_blocks(), 4);
        check_capacity_invariant(&pool);
    }

    #[test]
    fn membership_matches_the_region_extent() {
        let mut pool = Pool::new(8, 4).unwrap();
        let ptr = pool.allocate(8).unwrap();

        assert!(pool.contains(ptr));
        unsafe {
            assert!(pool.contains(NonNull::new_unchecked(ptr.as_ptr().add(31))));
            assert!(!pool.contains(NonNull::new_unchecked(ptr.as_ptr().add(32))));
        }
    }

    #[test]
    fn the_region_is_usable_memory() {
        let mut pool = Pool::new(64, 2).unwrap();
        let ptr = pool.allocate(64).unwrap();

        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0x5A, 64);
            assert_eq!(ptr.as_ptr().add(63).read(), 0x5A);
        }
    }
}
