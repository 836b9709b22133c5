//! Test utilities and reference models for anmat development.
//!
//! Provides [`ReferenceHeap`], a deliberately naive `Vec<bool>` model of the
//! bit heap's placement and accounting rules, and seeded workload fixtures
//! in [`fixtures`]. Property tests drive the real heap and the model with
//! the same operations and compare results step by step.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

/// Naive model of first-fit placement with one sentinel per allocation.
///
/// `alloc(n)` returns the lowest offset `s` such that positions
/// `s - 1` (when `s > 0`) through `s + n` are all free and inside the
/// arena. No bit tricks, no byte skipping.
pub struct ReferenceHeap {
    used: Vec<bool>,
    free_bytes: usize,
}

impl ReferenceHeap {
    pub fn new(capacity: usize) -> Self {
        Self {
            used: vec![false; capacity],
            free_bytes: capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.used.len()
    }

    pub fn free_bytes(&self) -> usize {
        self.free_bytes
    }

    fn fits_at(&self, start: usize, count: usize) -> bool {
        let Some(sentinel) = start.checked_add(count) else {
            return false;
        };
        if sentinel >= self.capacity() {
            return false;
        }
        let lead = if start == 0 { 0 } else { start - 1 };
        self.used[lead..=sentinel].iter().all(|&u| !u)
    }

    pub fn alloc(&mut self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let start = (0..self.capacity()).find(|&s| self.fits_at(s, count))?;
        self.used[start..start + count].fill(true);
        self.free_bytes -= count + 1;
        Some(start)
    }

    /// Release the run starting at `offset`. Anything that is not the first
    /// byte of a live run is ignored.
    pub fn free(&mut self, offset: usize) {
        if offset >= self.capacity() || !self.used[offset] {
            return;
        }
        if offset > 0 && self.used[offset - 1] {
            return;
        }
        let mut pos = offset;
        while pos < self.capacity() && self.used[pos] {
            self.used[pos] = false;
            pos += 1;
        }
        self.free_bytes += pos - offset + 1;
    }

    /// Offsets of every live allocation, in address order.
    pub fn live_offsets(&self) -> Vec<usize> {
        (0..self.capacity())
            .filter(|&i| self.used[i] && (i == 0 || !self.used[i - 1]))
            .collect()
    }
}
