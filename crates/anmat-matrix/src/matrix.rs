//! Heap-backed dense matrices.
//!
//! A [`Matrix`] owns one row table plus one buffer per row, all carved out
//! of a [`BitHeap`]. The table holds each row's arena offset as a
//! little-endian `u32`; rows hold `cols` little-endian `f64`s. The matrix
//! value itself is only a handle: every read and write goes through the
//! heap it was allocated from.

use std::io::{BufRead, Write};

use anmat_heap::{Allocation, BitHeap};

use crate::error::MatrixError;

/// Tolerance used by [`Matrix::equals`].
pub const ANMAT_EPSILON_DEFAULT: f64 = 1e-6;

const ENTRY: usize = std::mem::size_of::<u32>();
const VALUE: usize = std::mem::size_of::<f64>();

/// A `rows x cols` matrix of `f64` stored in a [`BitHeap`].
///
/// Not `Clone`: the handle owns its heap allocations and must be returned
/// with [`Matrix::free`] on the heap it came from.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct Matrix {
    rows: usize,
    cols: usize,
    table: Allocation,
}

fn read_entry(heap: &BitHeap, table: &Allocation, m: usize) -> usize {
    let mut buf = [0u8; ENTRY];
    buf.copy_from_slice(&heap.bytes(table)[m * ENTRY..(m + 1) * ENTRY]);
    u32::from_le_bytes(buf) as usize
}

fn write_entry(heap: &mut BitHeap, table: &Allocation, m: usize, offset: usize) {
    heap.bytes_mut(table)[m * ENTRY..(m + 1) * ENTRY]
        .copy_from_slice(&(offset as u32).to_le_bytes());
}

/// Free the first `count` rows listed in `table`, last row first.
fn release_rows(heap: &mut BitHeap, table: &Allocation, count: usize) {
    for m in (0..count).rev() {
        let offset = read_entry(heap, table, m);
        heap.free(offset);
    }
}

fn check_shape(
    op: &'static str,
    matrix: &Matrix,
    expected: (usize, usize),
) -> Result<(), MatrixError> {
    if matrix.shape() == expected {
        Ok(())
    } else {
        Err(MatrixError::DimensionMismatch {
            op,
            expected,
            found: matrix.shape(),
        })
    }
}

impl Matrix {
    /// Allocate a zero-filled `rows x cols` matrix.
    ///
    /// Allocates the row table first, then each row in order. If any
    /// allocation fails, rows obtained so far are freed in reverse order,
    /// then the table, so the heap's free-byte count is exactly what it was
    /// before the call.
    ///
    /// # Errors
    ///
    /// - [`MatrixError::BadArgument`] if `rows` or `cols` is zero.
    /// - [`MatrixError::Memory`] if the heap cannot supply a buffer.
    pub fn alloc(heap: &mut BitHeap, rows: usize, cols: usize) -> Result<Self, MatrixError> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::BadArgument);
        }
        let table_len = rows.checked_mul(ENTRY).ok_or(MatrixError::BadArgument)?;
        let row_len = cols.checked_mul(VALUE).ok_or(MatrixError::BadArgument)?;

        let table = heap.alloc(table_len)?;
        for m in 0..rows {
            match heap.alloc(row_len) {
                Ok(row) => {
                    heap.bytes_mut(&row).fill(0);
                    write_entry(heap, &table, m, row.offset());
                }
                Err(err) => {
                    tracing::debug!(rows, cols, failed_row = m, %err, "matrix alloc rolled back");
                    release_rows(heap, &table, m);
                    heap.release(table);
                    return Err(err.into());
                }
            }
        }
        Ok(Self { rows, cols, table })
    }

    /// Allocate a matrix and fill it row-major from `values`.
    ///
    /// Returns [`MatrixError::BadArgument`] if `values.len() != rows * cols`.
    pub fn from_slice(
        heap: &mut BitHeap,
        rows: usize,
        cols: usize,
        values: &[f64],
    ) -> Result<Self, MatrixError> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(MatrixError::BadArgument);
        }
        let matrix = Self::alloc(heap, rows, cols)?;
        matrix.write_all(heap, values);
        Ok(matrix)
    }

    /// Return every buffer to the heap: rows last-to-first, then the table.
    pub fn free(self, heap: &mut BitHeap) {
        release_rows(heap, &self.table, self.rows);
        heap.release(self.table);
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Arena offset of row `m`, as recorded in the row table.
    pub fn row_offset(&self, heap: &BitHeap, m: usize) -> usize {
        assert!(m < self.rows, "row {m} out of range for {} rows", self.rows);
        read_entry(heap, &self.table, m)
    }

    fn value_offset(&self, heap: &BitHeap, m: usize, n: usize) -> usize {
        assert!(n < self.cols, "column {n} out of range for {} cols", self.cols);
        self.row_offset(heap, m) + n * VALUE
    }

    /// Value at row `m`, column `n`.
    ///
    /// # Panics
    ///
    /// Panics if `m` or `n` is out of range.
    pub fn get(&self, heap: &BitHeap, m: usize, n: usize) -> f64 {
        let offset = self.value_offset(heap, m, n);
        let mut buf = [0u8; VALUE];
        buf.copy_from_slice(&heap.arena()[offset..offset + VALUE]);
        f64::from_le_bytes(buf)
    }

    /// Store `value` at row `m`, column `n`.
    ///
    /// # Panics
    ///
    /// Panics if `m` or `n` is out of range.
    pub fn set(&self, heap: &mut BitHeap, m: usize, n: usize, value: f64) {
        let offset = self.value_offset(heap, m, n);
        heap.arena_mut()[offset..offset + VALUE].copy_from_slice(&value.to_le_bytes());
    }

    /// Values of row `m`.
    pub fn row(&self, heap: &BitHeap, m: usize) -> Vec<f64> {
        (0..self.cols).map(|n| self.get(heap, m, n)).collect()
    }

    /// All values, row-major.
    pub fn to_vec(&self, heap: &BitHeap) -> Vec<f64> {
        (0..self.rows).flat_map(|m| self.row(heap, m)).collect()
    }

    fn write_all(&self, heap: &mut BitHeap, values: &[f64]) {
        debug_assert_eq!(values.len(), self.rows * self.cols);
        for (i, &value) in values.iter().enumerate() {
            self.set(heap, i / self.cols, i % self.cols, value);
        }
    }

    /// Whether both matrices have the same shape and every pair of values
    /// differs by at most [`ANMAT_EPSILON_DEFAULT`].
    pub fn equals(&self, other: &Matrix, heap: &BitHeap) -> bool {
        self.shape() == other.shape()
            && self
                .to_vec(heap)
                .iter()
                .zip(other.to_vec(heap))
                .all(|(a, b)| (a - b).abs() <= ANMAT_EPSILON_DEFAULT)
    }

    fn elementwise(
        op: &'static str,
        a: &Matrix,
        b: &Matrix,
        c: &Matrix,
        heap: &mut BitHeap,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<(), MatrixError> {
        check_shape(op, b, a.shape())?;
        check_shape(op, c, a.shape())?;
        for m in 0..a.rows {
            for n in 0..a.cols {
                let value = f(a.get(heap, m, n), b.get(heap, m, n));
                c.set(heap, m, n, value);
            }
        }
        Ok(())
    }

    /// `c = a + b`. All three must share a shape; `c` must already be
    /// allocated and may be the same matrix as `a` or `b`.
    pub fn add(a: &Matrix, b: &Matrix, c: &Matrix, heap: &mut BitHeap) -> Result<(), MatrixError> {
        Self::elementwise("add", a, b, c, heap, |x, y| x + y)
    }

    /// `c = a - b`. Same shape rules as [`Matrix::add`].
    pub fn subtract(
        a: &Matrix,
        b: &Matrix,
        c: &Matrix,
        heap: &mut BitHeap,
    ) -> Result<(), MatrixError> {
        Self::elementwise("subtract", a, b, c, heap, |x, y| x - y)
    }

    /// `c = a * b`. Requires `b.rows() == a.cols()` and `c` of shape
    /// `(a.rows(), b.cols())`. `c` may alias either operand.
    pub fn multiply(
        a: &Matrix,
        b: &Matrix,
        c: &Matrix,
        heap: &mut BitHeap,
    ) -> Result<(), MatrixError> {
        check_shape("multiply", b, (a.cols, b.cols))?;
        check_shape("multiply", c, (a.rows, b.cols))?;

        let lhs = a.to_vec(heap);
        let rhs = b.to_vec(heap);
        let mut product = vec![0.0; a.rows * b.cols];
        for m in 0..a.rows {
            for n in 0..b.cols {
                product[m * b.cols + n] = (0..a.cols)
                    .map(|k| lhs[m * a.cols + k] * rhs[k * b.cols + n])
                    .sum();
            }
        }
        c.write_all(heap, &product);
        Ok(())
    }

    /// Write the transpose of `a` into `b`, which must be
    /// `(a.cols(), a.rows())`.
    pub fn transpose(a: &Matrix, b: &Matrix, heap: &mut BitHeap) -> Result<(), MatrixError> {
        check_shape("transpose", b, (a.cols, a.rows))?;
        let values = a.to_vec(heap);
        let mut transposed = vec![0.0; values.len()];
        for m in 0..a.rows {
            for n in 0..a.cols {
                transposed[n * a.rows + m] = values[m * a.cols + n];
            }
        }
        b.write_all(heap, &transposed);
        Ok(())
    }

    /// Write the matrix as text: a `rows cols` header line, then one line
    /// per row of space-separated values.
    pub fn print<W: Write>(&self, heap: &BitHeap, out: &mut W) -> Result<(), MatrixError> {
        writeln!(out, "{} {}", self.rows, self.cols)?;
        for m in 0..self.rows {
            let line: Vec<String> = self.row(heap, m).iter().map(f64::to_string).collect();
            writeln!(out, "{}", line.join(" "))?;
        }
        out.flush()?;
        Ok(())
    }

    /// Read a matrix in the format written by [`Matrix::print`] and allocate
    /// it from `heap`.
    ///
    /// Blank lines are ignored. The whole input is parsed before anything is
    /// allocated, so a parse error never leaves heap state behind.
    pub fn scan<R: BufRead>(heap: &mut BitHeap, input: R) -> Result<Self, MatrixError> {
        let mut header: Option<(usize, usize)> = None;
        let mut values = Vec::new();
        let mut rows_read = 0usize;
        let mut last_line = 0usize;

        for (index, line) in input.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            last_line = lineno;
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let Some((rows, cols)) = header else {
                header = Some(parse_header(text, lineno)?);
                continue;
            };
            if rows_read == rows {
                return Err(MatrixError::Parse {
                    line: lineno,
                    reason: format!("unexpected row beyond the declared {rows}"),
                });
            }
            let before = values.len();
            for token in text.split_whitespace() {
                let value = token.parse::<f64>().map_err(|e| MatrixError::Parse {
                    line: lineno,
                    reason: format!("invalid value {token:?}: {e}"),
                })?;
                values.push(value);
            }
            let found = values.len() - before;
            if found != cols {
                return Err(MatrixError::Parse {
                    line: lineno,
                    reason: format!("expected {cols} values, found {found}"),
                });
            }
            rows_read += 1;
        }

        let Some((rows, cols)) = header else {
            return Err(MatrixError::Parse {
                line: last_line + 1,
                reason: "missing `rows cols` header".to_string(),
            });
        };
        if rows_read != rows {
            return Err(MatrixError::Parse {
                line: last_line + 1,
                reason: format!("expected {rows} rows, found {rows_read}"),
            });
        }
        Self::from_slice(heap, rows, cols, &values)
    }
}

fn parse_header(text: &str, line: usize) -> Result<(usize, usize), MatrixError> {
    let bad = |reason: String| MatrixError::Parse { line, reason };
    let dims = text
        .split_whitespace()
        .map(|t| t.parse::<usize>().map_err(|e| bad(format!("invalid dimension {t:?}: {e}"))))
        .collect::<Result<Vec<_>, _>>()?;
    match dims.as_slice() {
        &[rows, cols] => Ok((rows, cols)),
        _ => Err(bad(format!("expected `rows cols`, found {} fields", dims.len()))),
    }
}
