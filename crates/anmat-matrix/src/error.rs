//! Matrix error types.

use std::error::Error;
use std::fmt;
use std::io;

use anmat_heap::HeapError;

/// Errors from matrix allocation, arithmetic, and I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatrixError {
    /// Zero rows or columns requested.
    BadArgument,
    /// Operand shapes are incompatible for the operation.
    DimensionMismatch {
        /// Name of the operation.
        op: &'static str,
        /// Shape the operation required, as `(rows, cols)`.
        expected: (usize, usize),
        /// Shape it was given.
        found: (usize, usize),
    },
    /// The heap could not supply a buffer. Everything allocated before the
    /// failure has already been released.
    Memory(HeapError),
    /// Malformed text passed to [`Matrix::scan`](crate::Matrix::scan).
    Parse {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },
    /// The underlying reader or writer failed.
    Io {
        /// The I/O error message.
        reason: String,
    },
}

impl fmt::Display for MatrixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadArgument => write!(f, "matrix dimensions must be non-zero"),
            Self::DimensionMismatch {
                op,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{op}: expected {}x{} matrix, found {}x{}",
                    expected.0, expected.1, found.0, found.1
                )
            }
            Self::Memory(err) => write!(f, "matrix allocation failed: {err}"),
            Self::Parse { line, reason } => write!(f, "line {line}: {reason}"),
            Self::Io { reason } => write!(f, "i/o error: {reason}"),
        }
    }
}

impl Error for MatrixError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Memory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HeapError> for MatrixError {
    fn from(err: HeapError) -> Self {
        Self::Memory(err)
    }
}

impl From<io::Error> for MatrixError {
    fn from(err: io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
