//! Walks the two-pool chain through routing, fall-through and reuse.
//! Run with `RUST_LOG=trace` to watch the per-pool routing decisions.

use poolalloc::{PoolChain, PoolSpec};

fn log_alloc(what: &str, addr: *mut u8, bytes: usize) {
    println!("{what}: {bytes} bytes at {addr:?}");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Four 8-byte blocks, then two 64-byte blocks, tried in that order.
    let mut chain = PoolChain::new(&[PoolSpec::new(8, 4), PoolSpec::new(64, 2)])?;
    println!("chain capacity: {} bytes", chain.capacity_bytes());

    let small = chain.allocate(8)?;
    log_alloc("small", small.as_ptr(), 8);

    // Needs five 8-byte blocks; pool 0 has only three left, so this lands
    // in the 64-byte pool.
    let large = chain.allocate(40)?;
    log_alloc("large", large.as_ptr(), 40);

    chain.deallocate(small.as_ptr(), 8)?;
    println!("small freed");

    // Reuses the freed blocks at the front of pool 0.
    let reused = chain.allocate(16)?;
    log_alloc("reused", reused.as_ptr(), 16);
    assert_eq!(reused, small);

    chain.deallocate(reused.as_ptr(), 16)?;
    chain.deallocate(large.as_ptr(), 40)?;

    Ok(())
}
