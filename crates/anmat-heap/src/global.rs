//! The process-wide heap.
//!
//! One [`BitHeap`] of `1 << ANMAT_HEAP_SIZE_LOG` bytes lives for the whole
//! process behind a `OnceLock<Mutex<_>>`. The first call to any function in
//! this module builds it in the fully-free state; that lazy reset runs at
//! most once no matter how many threads race to it. [`heap_init`] resets it
//! explicitly at any later point.
//!
//! Each call holds the lock for its whole duration, so concurrent callers
//! are serialised rather than racing on the bitmap. Multi-step sequences
//! that must not interleave with other callers go through [`with_heap`].

use std::io;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::config::ANMAT_HEAP_SIZE_LOG;
use crate::error::HeapError;
use crate::handle::Allocation;
use crate::heap::BitHeap;

/// Capacity of the process-wide heap in bytes.
pub const HEAP_SIZE: usize = 1 << ANMAT_HEAP_SIZE_LOG;

static HEAP: OnceLock<Mutex<BitHeap>> = OnceLock::new();

fn lock() -> MutexGuard<'static, BitHeap> {
    HEAP.get_or_init(|| {
        tracing::debug!(capacity = HEAP_SIZE, "lazy global heap init");
        Mutex::new(BitHeap::default())
    })
    .lock()
    // Every heap operation leaves the bitmap consistent before it can
    // panic, so a poisoned lock still guards valid state.
    .unwrap_or_else(PoisonError::into_inner)
}

/// Whether the global heap has been created yet.
pub fn is_initialized() -> bool {
    HEAP.get().is_some()
}

/// Reset the global heap to the fully-free state.
pub fn heap_init() {
    lock().init();
}

/// Allocate `count` bytes from the global heap.
///
/// See [`BitHeap::alloc`].
pub fn heap_alloc(count: usize) -> Result<Allocation, HeapError> {
    lock().alloc(count)
}

/// Release the global allocation starting at `offset`. Invalid offsets are
/// ignored.
pub fn heap_free(offset: usize) {
    lock().free(offset);
}

/// Release a global allocation handle.
pub fn heap_release(allocation: Allocation) {
    lock().release(allocation);
}

/// Current free-byte counter of the global heap.
pub fn free_heap_bytes() -> usize {
    lock().free_bytes()
}

/// Render the global heap to `out`.
pub fn heap_print<W: io::Write>(out: &mut W) -> io::Result<()> {
    lock().dump(out)
}

/// Run `f` with exclusive access to the global heap.
///
/// Use this to read or write allocation bytes, or to perform several
/// operations atomically with respect to other callers.
pub fn with_heap<R>(f: impl FnOnce(&mut BitHeap) -> R) -> R {
    f(&mut lock())
}
