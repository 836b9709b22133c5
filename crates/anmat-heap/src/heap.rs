//! The bit-granular first-fit heap.
//!
//! [`BitHeap`] owns a fixed arena, its [`OccupancyBitmap`], and a running
//! free-byte counter. There is no per-allocation record: a live allocation
//! of `len` bytes at `offset` is exactly the bit pattern
//! `bits[offset..offset + len] == 1` followed by a clear sentinel bit at
//! `offset + len`.
//!
//! Two invariants hold after every completed operation:
//!
//! - Every live allocation holds `len + 1` bitmap positions; its sentinel is
//!   never handed to another allocation.
//! - No two runs of set bits touch. The scan refuses to open a window on a
//!   position whose predecessor is set, so a sentinel can never become the
//!   first byte of a neighbouring allocation.
//!
//! Together they make the counter recomputable from the bitmap alone:
//! `free_bytes == zero bits - live runs`. Debug builds check this after
//! every mutation.

use std::io;

use crate::bitmap::OccupancyBitmap;
use crate::config::HeapConfig;
use crate::dump::HeapDump;
use crate::error::{HeapError, InvariantViolation};
use crate::handle::Allocation;

/// A fixed-capacity heap with one occupancy bit per arena byte.
///
/// All operations are O(capacity) at worst and take `&mut self` when they
/// mutate; share a heap across threads by wrapping it in a `Mutex` (see
/// [`crate::global`]).
pub struct BitHeap {
    config: HeapConfig,
    /// Backing store. Never zeroed by the heap after construction.
    arena: Box<[u8]>,
    bitmap: OccupancyBitmap,
    /// Positions available to future allocations.
    free_bytes: usize,
}

impl BitHeap {
    /// Create a heap from a validated configuration.
    ///
    /// Returns `Err(HeapError::InvalidConfig)` if `size_log` is out of range.
    pub fn new(config: HeapConfig) -> Result<Self, HeapError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create a heap of `1 << size_log` bytes.
    pub fn with_size_log(size_log: u32) -> Result<Self, HeapError> {
        Self::new(HeapConfig::new(size_log))
    }

    fn build(config: HeapConfig) -> Self {
        let capacity = config.capacity();
        Self {
            config,
            arena: vec![0u8; capacity].into_boxed_slice(),
            bitmap: OccupancyBitmap::new(capacity),
            free_bytes: capacity,
        }
    }

    /// Reset to the fully-free state. Idempotent.
    ///
    /// Arena contents are left as they are; only the bitmap and counter
    /// change.
    pub fn init(&mut self) {
        self.bitmap.reset();
        self.free_bytes = self.capacity();
        tracing::trace!(capacity = self.capacity(), "heap init");
    }

    /// Allocate `count` contiguous bytes, first fit.
    ///
    /// On success the free-byte counter drops by `count + 1`: the payload
    /// plus the sentinel that terminates it. The returned bytes hold
    /// whatever the arena held before; zeroing is the caller's job.
    ///
    /// # Errors
    ///
    /// - [`HeapError::BadArgument`] if `count == 0`.
    /// - [`HeapError::MemoryExhausted`] if no window of `count + 1` free
    ///   positions exists. Nothing is modified.
    pub fn alloc(&mut self, count: usize) -> Result<Allocation, HeapError> {
        if count == 0 {
            return Err(HeapError::BadArgument);
        }

        let Some(start) = self.find_window(count) else {
            tracing::debug!(requested = count, free = self.free_bytes, "heap exhausted");
            return Err(HeapError::MemoryExhausted {
                requested: count,
                free: self.free_bytes,
            });
        };

        self.mark(start, count);
        tracing::trace!(offset = start, count, free = self.free_bytes, "heap alloc");
        self.debug_check();
        Ok(Allocation::new(start, count))
    }

    /// Release the allocation starting at `offset`.
    ///
    /// Offsets that do not start a live allocation are ignored silently:
    /// out-of-range offsets, already-released offsets, and offsets into the
    /// middle of an allocation all leave the heap untouched. Use
    /// [`try_free`](Self::try_free) to find out which case applied.
    pub fn free(&mut self, offset: usize) {
        if let Err(err) = self.try_free(offset) {
            tracing::trace!(offset, %err, "ignoring heap free");
        }
    }

    /// Release an allocation handle.
    pub fn release(&mut self, allocation: Allocation) {
        self.free(allocation.offset());
    }

    /// Release the allocation starting at `offset`, reporting misuse.
    ///
    /// Returns the payload length released. The counter rises by that
    /// length plus one for the sentinel.
    pub fn try_free(&mut self, offset: usize) -> Result<usize, HeapError> {
        if offset >= self.capacity() {
            return Err(HeapError::OutOfBounds {
                offset,
                capacity: self.capacity(),
            });
        }
        if !self.bitmap.is_set(offset) {
            return Err(HeapError::NotAllocated { offset });
        }
        if offset > 0 && self.bitmap.is_set(offset - 1) {
            return Err(HeapError::InteriorOffset { offset });
        }

        // Runs past the last arena byte stop on the guard byte.
        let mut bit = offset;
        while self.bitmap.is_set(bit) {
            self.bitmap.clear(bit);
            self.free_bytes += 1;
            bit += 1;
        }
        // The sentinel goes back to the pool as well.
        self.free_bytes += 1;

        let released = bit - offset;
        tracing::trace!(offset, released, free = self.free_bytes, "heap free");
        self.debug_check();
        Ok(released)
    }

    /// Scan for the first window of `count` payload positions plus a
    /// sentinel, all eligible. Returns the window start.
    ///
    /// A position is eligible when it and its predecessor are both clear.
    /// Fully occupied bitmap bytes are skipped whole.
    fn find_window(&self, count: usize) -> Option<usize> {
        let mut start: Option<usize> = None;
        let mut prev_used = false;

        for index in 0..self.bitmap.byte_len() {
            let byte = self.bitmap.byte(index);
            if byte == 0xFF {
                start = None;
                prev_used = true;
                continue;
            }
            for bit in 0..8 {
                let pos = (index << 3) | bit;
                let used = byte & (1 << bit) != 0;
                if !used && !prev_used {
                    match start {
                        None => start = Some(pos),
                        Some(s) if pos - s == count => return Some(s),
                        Some(_) => {}
                    }
                } else {
                    start = None;
                }
                prev_used = used;
            }
        }
        None
    }

    fn mark(&mut self, start: usize, count: usize) {
        for bit in start..start + count {
            debug_assert!(!self.bitmap.is_set(bit), "window bit {bit} already set");
            self.bitmap.set(bit);
        }
        // Forced rather than checked: the scan already saw it clear.
        self.bitmap.clear(start + count);
        self.free_bytes -= count + 1;
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check_invariants(), Ok(()));
    }

    /// Arena capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.config.capacity()
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> HeapConfig {
        self.config
    }

    /// Current value of the free-byte counter.
    pub fn free_bytes(&self) -> usize {
        self.free_bytes
    }

    /// Free bytes recomputed from the bitmap: clear bits minus one reserved
    /// sentinel per live allocation.
    pub fn recount_free_bytes(&self) -> usize {
        self.bitmap
            .count_zeros()
            .saturating_sub(self.bitmap.count_runs())
    }

    /// Verify the guard byte and that the counter agrees with the bitmap.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let guard = self.bitmap.guard();
        if guard != 0 {
            return Err(InvariantViolation::GuardByteSet { value: guard });
        }
        let recounted = self.recount_free_bytes();
        if recounted != self.free_bytes {
            return Err(InvariantViolation::CounterMismatch {
                counter: self.free_bytes,
                recounted,
            });
        }
        Ok(())
    }

    /// The largest `count` for which [`alloc`](Self::alloc) would succeed
    /// right now, or 0 if even a one-byte request would fail.
    pub fn largest_free_window(&self) -> usize {
        let mut longest = 0usize;
        let mut run = 0usize;
        for pos in 0..self.capacity() {
            let eligible =
                !self.bitmap.is_set(pos) && (pos == 0 || !self.bitmap.is_set(pos - 1));
            if eligible {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        longest.saturating_sub(1)
    }

    /// The live allocation starting exactly at `offset`, if any.
    pub fn allocation_at(&self, offset: usize) -> Option<Allocation> {
        let starts_run = self.bitmap.is_set(offset)
            && (offset == 0 || !self.bitmap.is_set(offset - 1));
        starts_run.then(|| Allocation::new(offset, self.bitmap.run_len(offset)))
    }

    /// Every live allocation in address order, recovered from the bitmap.
    pub fn live_allocations(&self) -> impl Iterator<Item = Allocation> + '_ {
        (0..self.capacity()).filter_map(move |offset| self.allocation_at(offset))
    }

    /// Read-only view of the whole arena.
    pub fn arena(&self) -> &[u8] {
        &self.arena
    }

    /// Mutable view of the whole arena.
    ///
    /// Writes outside live allocations are not tracked by the heap and may
    /// be overwritten by later callers.
    pub fn arena_mut(&mut self) -> &mut [u8] {
        &mut self.arena
    }

    /// Read-only view of the occupancy bitmap.
    pub fn bitmap(&self) -> &OccupancyBitmap {
        &self.bitmap
    }

    /// Payload bytes of `allocation`.
    ///
    /// # Panics
    ///
    /// Panics if the handle extends past this heap's arena.
    pub fn bytes(&self, allocation: &Allocation) -> &[u8] {
        &self.arena[allocation.offset()..allocation.end()]
    }

    /// Mutable payload bytes of `allocation`.
    ///
    /// # Panics
    ///
    /// Panics if the handle extends past this heap's arena.
    pub fn bytes_mut(&mut self, allocation: &Allocation) -> &mut [u8] {
        &mut self.arena[allocation.offset()..allocation.end()]
    }

    /// Arena bytes `[offset, offset + len)`, or `None` if out of range.
    pub fn bytes_at(&self, offset: usize, len: usize) -> Option<&[u8]> {
        self.arena.get(offset..offset.checked_add(len)?)
    }

    /// Mutable arena bytes `[offset, offset + len)`, or `None` if out of range.
    pub fn bytes_at_mut(&mut self, offset: usize, len: usize) -> Option<&mut [u8]> {
        self.arena.get_mut(offset..offset.checked_add(len)?)
    }

    /// A [`Display`](std::fmt::Display) adaptor rendering the bitmap and
    /// occupied arena bytes.
    pub fn display(&self) -> HeapDump<'_> {
        HeapDump::new(self)
    }

    /// Write the heap rendering to `out` and flush it.
    pub fn dump<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self.display())?;
        out.flush()
    }
}

impl Default for BitHeap {
    fn default() -> Self {
        Self::build(HeapConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap_1k() -> BitHeap {
        BitHeap::default()
    }

    #[test]
    fn new_heap_is_fully_free() {
        let heap = heap_1k();
        assert_eq!(heap.capacity(), 1024);
        assert_eq!(heap.free_bytes(), 1024);
        assert_eq!(heap.largest_free_window(), 1023);
        assert_eq!(heap.live_allocations().count(), 0);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(matches!(
            BitHeap::with_size_log(40),
            Err(HeapError::InvalidConfig { size_log: 40 })
        ));
    }

    #[test]
    fn zero_alloc_is_bad_argument() {
        let mut heap = heap_1k();
        assert_eq!(heap.alloc(0), Err(HeapError::BadArgument));
        assert_eq!(heap.free_bytes(), 1024);
    }

    #[test]
    fn first_alloc_starts_at_zero() {
        let mut heap = heap_1k();
        let a = heap.alloc(8).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(a.len(), 8);
        assert_eq!(heap.free_bytes(), 1015);
    }

    #[test]
    fn sentinel_separates_neighbours() {
        let mut heap = heap_1k();
        let a = heap.alloc(3).unwrap();
        let b = heap.alloc(3).unwrap();
        assert_eq!(a.offset(), 0);
        // Bit 3 is a's sentinel, so b opens at 4.
        assert_eq!(b.offset(), 4);
        assert!(!heap.bitmap().is_set(3));
        assert!(!heap.bitmap().is_set(7));
    }

    #[test]
    fn freed_sentinel_is_not_reused_as_window_start() {
        let mut heap = heap_1k();
        let a = heap.alloc(4).unwrap();
        let b = heap.alloc(4).unwrap();
        assert_eq!(b.offset(), 5);
        heap.release(a);
        let c = heap.alloc(4).unwrap();
        assert_eq!(c.offset(), 0);
        // Bit 4 is c's sentinel and bit 9 is b's; neither may open a window.
        let d = heap.alloc(1).unwrap();
        assert_eq!(d.offset(), 10);
    }

    #[test]
    fn whole_arena_minus_sentinel_fits() {
        let mut heap = heap_1k();
        let a = heap.alloc(1023).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(heap.free_bytes(), 0);
        assert!(matches!(
            heap.alloc(1),
            Err(HeapError::MemoryExhausted { requested: 1, free: 0 })
        ));
    }

    #[test]
    fn capacity_sized_request_fails() {
        let mut heap = heap_1k();
        assert!(heap.alloc(1024).is_err());
        assert!(heap.alloc(usize::MAX).is_err());
        assert_eq!(heap.free_bytes(), 1024);
    }

    #[test]
    fn full_bytes_are_skipped() {
        let mut heap = heap_1k();
        let a = heap.alloc(16).unwrap();
        let b = heap.alloc(5).unwrap();
        assert_eq!(heap.bitmap().byte(0), 0xFF);
        assert_eq!(heap.bitmap().byte(1), 0xFF);
        assert_eq!(b.offset(), 17);
        heap.release(a);
        heap.release(b);
        assert_eq!(heap.free_bytes(), 1024);
    }

    #[test]
    fn free_out_of_range_is_silent() {
        let mut heap = heap_1k();
        let _a = heap.alloc(8).unwrap();
        heap.free(1024);
        heap.free(usize::MAX);
        assert_eq!(heap.free_bytes(), 1015);
    }

    #[test]
    fn double_free_leaves_counter_alone() {
        let mut heap = heap_1k();
        let a = heap.alloc(8).unwrap();
        heap.release(a);
        heap.release(a);
        assert_eq!(heap.free_bytes(), 1024);
        assert_eq!(heap.check_invariants(), Ok(()));
    }

    #[test]
    fn try_free_reports_misuse() {
        let mut heap = heap_1k();
        let a = heap.alloc(8).unwrap();
        assert_eq!(
            heap.try_free(2048),
            Err(HeapError::OutOfBounds {
                offset: 2048,
                capacity: 1024
            })
        );
        assert_eq!(
            heap.try_free(3),
            Err(HeapError::InteriorOffset { offset: 3 })
        );
        assert_eq!(
            heap.try_free(100),
            Err(HeapError::NotAllocated { offset: 100 })
        );
        assert_eq!(heap.try_free(a.offset()), Ok(8));
        assert_eq!(
            heap.try_free(a.offset()),
            Err(HeapError::NotAllocated { offset: 0 })
        );
        assert_eq!(heap.free_bytes(), 1024);
    }

    #[test]
    fn init_is_idempotent() {
        let mut heap = heap_1k();
        let _ = heap.alloc(100).unwrap();
        heap.init();
        heap.init();
        assert_eq!(heap.free_bytes(), 1024);
        assert_eq!(heap.live_allocations().count(), 0);
    }

    #[test]
    fn init_does_not_zero_arena() {
        let mut heap = heap_1k();
        let a = heap.alloc(4).unwrap();
        heap.bytes_mut(&a).copy_from_slice(&[1, 2, 3, 4]);
        heap.init();
        let b = heap.alloc(4).unwrap();
        assert_eq!(heap.bytes(&b), &[1, 2, 3, 4]);
    }

    #[test]
    fn live_allocations_in_address_order() {
        let mut heap = heap_1k();
        let a = heap.alloc(2).unwrap();
        let b = heap.alloc(10).unwrap();
        let c = heap.alloc(1).unwrap();
        heap.release(b);
        let live: Vec<_> = heap.live_allocations().collect();
        assert_eq!(live, vec![a, c]);
        assert_eq!(heap.allocation_at(a.offset()), Some(a));
        assert_eq!(heap.allocation_at(1), None);
    }

    #[test]
    fn largest_free_window_tracks_gaps() {
        let mut heap = BitHeap::with_size_log(5).unwrap();
        let a = heap.alloc(10).unwrap();
        let _b = heap.alloc(10).unwrap();
        // 32 - 22 = 10 positions left after b's sentinel; 9 usable.
        assert_eq!(heap.largest_free_window(), 9);
        heap.release(a);
        assert_eq!(heap.largest_free_window(), 10);
        assert!(heap.alloc(11).is_err());
        assert!(heap.alloc(10).is_ok());
    }

    #[test]
    fn bytes_at_checks_bounds() {
        let heap = heap_1k();
        assert_eq!(heap.bytes_at(1020, 4).map(<[u8]>::len), Some(4));
        assert!(heap.bytes_at(1020, 5).is_none());
        assert!(heap.bytes_at(usize::MAX, 2).is_none());
    }

    mod proptests {
        use super::*;
        use anmat_test_utils::ReferenceHeap;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Alloc(usize),
            Free(usize),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1usize..48).prop_map(Op::Alloc),
                (0usize..64).prop_map(Op::Free),
            ]
        }

        proptest! {
            #[test]
            fn matches_reference_model(ops in proptest::collection::vec(op(), 1..80)) {
                let mut heap = BitHeap::with_size_log(8).unwrap();
                let mut model = ReferenceHeap::new(256);
                let mut live: Vec<Allocation> = Vec::new();

                for op in ops {
                    match op {
                        Op::Alloc(count) => {
                            let got = heap.alloc(count).ok();
                            let want = model.alloc(count);
                            prop_assert_eq!(got.map(|a| a.offset()), want);
                            if let Some(a) = got {
                                live.push(a);
                            }
                        }
                        Op::Free(pick) if !live.is_empty() => {
                            let a = live.swap_remove(pick % live.len());
                            heap.release(a);
                            model.free(a.offset());
                        }
                        Op::Free(_) => {}
                    }
                    prop_assert_eq!(heap.free_bytes(), model.free_bytes());
                    prop_assert_eq!(heap.check_invariants(), Ok(()));
                }
            }

            #[test]
            fn alloc_within_largest_window_succeeds(
                sizes in proptest::collection::vec(1usize..40, 0..12),
                probe in 1usize..300,
            ) {
                let mut heap = BitHeap::with_size_log(8).unwrap();
                for (i, size) in sizes.iter().enumerate() {
                    if let Ok(a) = heap.alloc(*size) {
                        if i % 2 == 0 {
                            heap.release(a);
                        }
                    }
                }
                let before = heap.free_bytes();
                let largest = heap.largest_free_window();
                let result = heap.alloc(probe);
                if probe <= largest {
                    prop_assert!(result.is_ok());
                    prop_assert_eq!(heap.free_bytes(), before - probe - 1);
                } else {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(heap.free_bytes(), before);
                }
            }

            #[test]
            fn alloc_then_free_restores_counter(
                warmup in proptest::collection::vec(1usize..30, 0..8),
                count in 1usize..120,
            ) {
                let mut heap = BitHeap::with_size_log(8).unwrap();
                for size in warmup {
                    let _ = heap.alloc(size);
                }
                let before = heap.free_bytes();
                if let Ok(a) = heap.alloc(count) {
                    heap.release(a);
                }
                prop_assert_eq!(heap.free_bytes(), before);
            }

            #[test]
            fn freeing_everything_in_any_order_restores_capacity(
                sizes in proptest::collection::vec(1usize..30, 1..16),
                order in proptest::collection::vec(any::<usize>(), 16),
            ) {
                let mut heap = BitHeap::with_size_log(8).unwrap();
                let mut live: Vec<Allocation> =
                    sizes.iter().filter_map(|&s| heap.alloc(s).ok()).collect();
                for pick in order {
                    if live.is_empty() {
                        break;
                    }
                    let a = live.swap_remove(pick % live.len());
                    heap.release(a);
                }
                for a in live {
                    heap.release(a);
                }
                prop_assert_eq!(heap.free_bytes(), heap.capacity());
            }
        }
    }
}
