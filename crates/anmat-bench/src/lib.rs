//! Benchmark profiles for the anmat bit heap.
//!
//! - [`fragmented_profile`]: a heap left part-full by seeded churn, so that
//!   first-fit scans have to walk past live runs and sentinels.
//! - [`checkerboard_profile`]: alternating small live and free runs across
//!   the whole arena, the worst case for a large request.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use anmat_heap::{Allocation, BitHeap, HeapError};
use anmat_test_utils::fixtures::{churn_workload, ChurnOp};

/// Build a heap of `1 << size_log` bytes and run `steps` churn operations
/// from `seed` against it. Returns the heap and its live allocations.
pub fn fragmented_profile(
    size_log: u32,
    seed: u64,
    steps: usize,
) -> Result<(BitHeap, Vec<Allocation>), HeapError> {
    let mut heap = BitHeap::with_size_log(size_log)?;
    let max_size = (heap.capacity() / 32).max(1);
    let mut live = Vec::new();
    for op in churn_workload(seed, steps, max_size) {
        match op {
            ChurnOp::Alloc(n) => live.extend(heap.alloc(n).ok()),
            ChurnOp::Free(pick) if !live.is_empty() => {
                let a = live.swap_remove(pick % live.len());
                heap.release(a);
            }
            ChurnOp::Free(_) => {}
        }
    }
    Ok((heap, live))
}

/// Fill a heap with 3-byte allocations (4 positions each), then free every
/// other one. Every free gap is 4 positions wide, so only requests of up to
/// 3 bytes fit anywhere.
pub fn checkerboard_profile(size_log: u32) -> Result<BitHeap, HeapError> {
    let mut heap = BitHeap::with_size_log(size_log)?;
    let mut live = Vec::new();
    while let Ok(a) = heap.alloc(3) {
        live.push(a);
    }
    for a in live.into_iter().step_by(2) {
        heap.release(a);
    }
    Ok(heap)
}
