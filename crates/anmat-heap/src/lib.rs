//! Bit-granular first-fit allocation over a fixed static arena.
//!
//! The heap replaces dynamic memory with a single power-of-two byte arena
//! and tracks it with one occupancy bit per byte. Allocation boundaries are
//! not stored anywhere: every allocation is a run of set bits followed by
//! one clear sentinel bit, and both allocation and release work purely by
//! scanning that bit pattern.
//!
//! # Architecture
//!
//! ```text
//! global (OnceLock<Mutex<BitHeap>>, lazy-once process heap)
//! └── BitHeap
//!     ├── arena: Box<[u8]>           (1 << size_log bytes)
//!     ├── OccupancyBitmap            (size / 8 bytes + 1 zero guard byte)
//!     └── free_bytes                 (payload + sentinel accounting)
//! ```
//!
//! # Accounting
//!
//! An allocation of `n` bytes costs `n + 1` free bytes: the payload plus a
//! sentinel that keeps neighbouring allocations apart. A heap of `N` bytes
//! can therefore hold at most a single `N - 1` byte allocation.
//!
//! ```
//! use anmat_heap::BitHeap;
//!
//! let mut heap = BitHeap::default();
//! let a = heap.alloc(8).unwrap();
//! assert_eq!(heap.free_bytes(), 1024 - 9);
//! heap.bytes_mut(&a).copy_from_slice(&12.345f64.to_le_bytes());
//! heap.release(a);
//! assert_eq!(heap.free_bytes(), 1024);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bitmap;
pub mod config;
pub mod dump;
pub mod error;
pub mod global;
pub mod handle;
pub mod heap;

// Public re-exports for the primary API surface.
pub use bitmap::OccupancyBitmap;
pub use config::{HeapConfig, ANMAT_HEAP_SIZE_LOG};
pub use dump::HeapDump;
pub use error::{HeapError, InvariantViolation};
pub use global::HEAP_SIZE;
pub use handle::Allocation;
pub use heap::BitHeap;
