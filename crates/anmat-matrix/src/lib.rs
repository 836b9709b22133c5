//! Dense `f64` matrices stored in the anmat bit heap.
//!
//! Every [`Matrix`] is a row table plus one buffer per row, allocated from a
//! [`BitHeap`](anmat_heap::BitHeap) and returned to it in reverse order.
//! Allocation is all-or-nothing: when the heap runs out part-way through,
//! the rows already obtained are released before the error is returned.
//!
//! ```
//! use anmat_heap::BitHeap;
//! use anmat_matrix::Matrix;
//!
//! let mut heap = BitHeap::default();
//! let a = Matrix::from_slice(&mut heap, 2, 2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let b = Matrix::alloc(&mut heap, 2, 2).unwrap();
//! Matrix::transpose(&a, &b, &mut heap).unwrap();
//! assert_eq!(b.to_vec(&heap), vec![1.0, 3.0, 2.0, 4.0]);
//! b.free(&mut heap);
//! a.free(&mut heap);
//! assert_eq!(heap.free_bytes(), heap.capacity());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod matrix;

pub use error::MatrixError;
pub use matrix::{Matrix, ANMAT_EPSILON_DEFAULT};
