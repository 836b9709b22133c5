//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// A zero-byte allocation was requested.
    BadArgument,
    /// No free window is large enough for the request.
    MemoryExhausted {
        /// Number of payload bytes requested.
        requested: usize,
        /// Free-byte counter at the time of the request.
        free: usize,
    },
    /// A release offset lies outside the arena.
    OutOfBounds {
        /// The offending offset.
        offset: usize,
        /// Arena capacity in bytes.
        capacity: usize,
    },
    /// A release offset does not start a live allocation (never allocated,
    /// or already released).
    NotAllocated {
        /// The offending offset.
        offset: usize,
    },
    /// A release offset points into the middle of a live allocation.
    InteriorOffset {
        /// The offending offset.
        offset: usize,
    },
    /// The heap configuration is outside the supported range.
    InvalidConfig {
        /// The rejected size log.
        size_log: u32,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadArgument => write!(f, "cannot allocate zero bytes"),
            Self::MemoryExhausted { requested, free } => {
                write!(
                    f,
                    "heap exhausted: requested {requested} bytes, {free} bytes free"
                )
            }
            Self::OutOfBounds { offset, capacity } => {
                write!(f, "offset {offset} outside heap of {capacity} bytes")
            }
            Self::NotAllocated { offset } => {
                write!(f, "offset {offset} is not the start of a live allocation")
            }
            Self::InteriorOffset { offset } => {
                write!(f, "offset {offset} points inside a live allocation")
            }
            Self::InvalidConfig { size_log } => {
                write!(f, "unsupported heap size log {size_log}")
            }
        }
    }
}

impl Error for HeapError {}

/// A broken bitmap or counter invariant, reported by
/// [`BitHeap::check_invariants`](crate::BitHeap::check_invariants).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The trailing guard byte of the bitmap is not zero.
    GuardByteSet {
        /// Value found in the guard byte.
        value: u8,
    },
    /// The free-byte counter disagrees with the bitmap.
    CounterMismatch {
        /// Counter value.
        counter: usize,
        /// Value recomputed from the bitmap.
        recounted: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GuardByteSet { value } => {
                write!(f, "bitmap guard byte is 0x{value:02X}, expected 0x00")
            }
            Self::CounterMismatch { counter, recounted } => {
                write!(
                    f,
                    "free-byte counter is {counter}, bitmap accounts for {recounted}"
                )
            }
        }
    }
}

impl Error for InvariantViolation {}
