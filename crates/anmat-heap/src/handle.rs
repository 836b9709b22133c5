//! Allocation handles.
//!
//! An [`Allocation`] is the validated result of a successful
//! [`BitHeap::alloc`](crate::BitHeap::alloc): the byte offset of the
//! window within the arena and the payload length. It carries no pointer,
//! so resolving it always goes through the heap's bounds-checked slices.

use std::fmt;

/// A live region of the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct Allocation {
    /// Byte offset of the first payload byte.
    pub(crate) offset: u32,
    /// Payload length in bytes (excludes the sentinel).
    pub(crate) len: u32,
}

impl Allocation {
    pub(crate) fn new(offset: usize, len: usize) -> Self {
        Self {
            offset: offset as u32,
            len: len as u32,
        }
    }

    /// Byte offset of the allocation within the arena.
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Always `false`: the heap never hands out empty allocations.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bitmap positions this allocation holds, sentinel included.
    pub fn footprint(&self) -> usize {
        self.len() + 1
    }

    /// One past the last payload byte; the position of the sentinel bit.
    pub fn end(&self) -> usize {
        self.offset() + self.len()
    }
}

impl fmt::Display for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Allocation(off={}, len={})", self.offset, self.len)
    }
}
