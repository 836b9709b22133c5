//! Deterministic heap workloads and footprint arithmetic.
//!
//! - [`churn_workload`] — seeded interleaving of allocations and releases.
//! - [`footprint`] — free bytes consumed by a set of allocation sizes.
//! - [`matrix_footprint`] — free bytes consumed by one heap-backed matrix.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// One step of a churn workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChurnOp {
    /// Request this many bytes.
    Alloc(usize),
    /// Release a live allocation; the value picks one modulo the number
    /// currently live.
    Free(usize),
}

/// Build `len` churn operations from `seed`.
///
/// Roughly three allocations for every two releases, sizes in
/// `1..=max_size`. The same seed always yields the same sequence.
pub fn churn_workload(seed: u64, len: usize, max_size: usize) -> Vec<ChurnOp> {
    assert!(max_size > 0, "max_size must be positive");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            let roll = rng.next_u32();
            if roll % 5 < 3 {
                ChurnOp::Alloc(1 + (rng.next_u32() as usize) % max_size)
            } else {
                ChurnOp::Free(rng.next_u32() as usize)
            }
        })
        .collect()
}

/// Free bytes consumed by allocations of the given sizes: one sentinel each.
pub fn footprint(sizes: &[usize]) -> usize {
    sizes.iter().map(|s| s + 1).sum()
}

/// Free bytes consumed by a `rows x cols` matrix: a row table of one `u32`
/// offset per row, plus one row of `cols` `f64`s per row.
pub fn matrix_footprint(rows: usize, cols: usize) -> usize {
    let table = rows * std::mem::size_of::<u32>();
    let row = cols * std::mem::size_of::<f64>();
    footprint(&[table]) + rows * footprint(&[row])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workload_is_deterministic() {
        assert_eq!(churn_workload(7, 50, 16), churn_workload(7, 50, 16));
        assert_ne!(churn_workload(7, 50, 16), churn_workload(8, 50, 16));
    }

    #[test]
    fn workload_sizes_in_range() {
        for op in churn_workload(1, 200, 10) {
            if let ChurnOp::Alloc(n) = op {
                assert!((1..=10).contains(&n));
            }
        }
    }

    #[test]
    fn footprints() {
        assert_eq!(footprint(&[8]), 9);
        assert_eq!(footprint(&[16, 24]), 42);
        // 3 x 5 matrix: 12-byte table + 3 rows of 40 bytes.
        assert_eq!(matrix_footprint(3, 5), 13 + 3 * 41);
    }
}
