//! Heap configuration parameters.

use crate::error::HeapError;

/// Log base two of the default arena size in bytes.
///
/// The process-wide heap in [`crate::global`] is always built with this
/// value, giving a 1024-byte arena.
pub const ANMAT_HEAP_SIZE_LOG: u32 = 10;

/// Configuration for a [`BitHeap`](crate::BitHeap).
///
/// The arena capacity is `1 << size_log` bytes. Validated at construction;
/// immutable after the heap is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Log base two of the arena size in bytes.
    ///
    /// Default: [`ANMAT_HEAP_SIZE_LOG`]. Must lie in
    /// `MIN_SIZE_LOG..=MAX_SIZE_LOG` so that the arena is a whole number of
    /// bitmap bytes and the bitmap stays small enough to scan linearly.
    pub size_log: u32,
}

impl HeapConfig {
    /// Smallest accepted `size_log` (one bitmap byte, 8 arena bytes).
    pub const MIN_SIZE_LOG: u32 = 3;

    /// Largest accepted `size_log` (16 MiB arena).
    pub const MAX_SIZE_LOG: u32 = 24;

    /// Create a config for an arena of `1 << size_log` bytes.
    pub fn new(size_log: u32) -> Self {
        Self { size_log }
    }

    /// Check that `size_log` is within the supported range.
    pub fn validate(&self) -> Result<(), HeapError> {
        if (Self::MIN_SIZE_LOG..=Self::MAX_SIZE_LOG).contains(&self.size_log) {
            Ok(())
        } else {
            Err(HeapError::InvalidConfig {
                size_log: self.size_log,
            })
        }
    }

    /// Arena capacity in bytes.
    pub fn capacity(&self) -> usize {
        1usize << self.size_log
    }

    /// Bitmap storage length in bytes, including the trailing zero byte.
    pub fn bitmap_bytes(&self) -> usize {
        (self.capacity() >> 3) + 1
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(ANMAT_HEAP_SIZE_LOG)
    }
}
