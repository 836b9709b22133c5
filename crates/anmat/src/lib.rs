//! anmat: a small numerics library on a bit-granular static-arena heap.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the anmat sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use anmat::prelude::*;
//!
//! let mut heap = BitHeap::default();
//! let a = Matrix::from_slice(&mut heap, 2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = Matrix::alloc(&mut heap, 2, 2).unwrap();
//! Matrix::add(&a, &a, &b, &mut heap).unwrap();
//! assert_eq!(b.get(&heap, 1, 1), 8.0);
//!
//! // Each allocation costs its payload plus one sentinel byte.
//! assert!(heap.free_bytes() < heap.capacity());
//! b.free(&mut heap);
//! a.free(&mut heap);
//! assert_eq!(heap.free_bytes(), heap.capacity());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`heap`] | `anmat-heap` | `BitHeap`, the process-wide heap, diagnostics |
//! | [`matrix`] | `anmat-matrix` | Heap-backed `f64` matrices |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Bit-granular heap (`anmat-heap`).
///
/// [`heap::BitHeap`] is the owned allocator; [`heap::global`] holds the
/// lazily initialised process-wide instance.
pub use anmat_heap as heap;

/// Heap-backed matrices (`anmat-matrix`).
pub use anmat_matrix as matrix;

/// Common imports for typical anmat usage.
///
/// ```rust
/// use anmat::prelude::*;
/// ```
pub mod prelude {
    // Heap
    pub use anmat_heap::{Allocation, BitHeap, HeapConfig, HeapError};

    // Process-wide heap
    pub use anmat_heap::global::{
        free_heap_bytes, heap_alloc, heap_free, heap_init, heap_print, with_heap,
    };

    // Matrices
    pub use anmat_matrix::{Matrix, MatrixError};
}
