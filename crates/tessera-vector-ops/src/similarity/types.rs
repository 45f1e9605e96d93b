//! Borrowed matrix view and owned threshold results.

use serde::Serialize;

use crate::error::{VectorOpsError, VectorOpsResult};

/// Row-major view over caller-owned embeddings.
///
/// Row `i` occupies `data[i * dim..(i + 1) * dim]`. The view never copies
/// or mutates the data.
///
/// # Example
///
/// ```
/// use tessera_vector_ops::EmbeddingMatrix;
///
/// let data = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
/// let matrix = EmbeddingMatrix::new(&data, 2).unwrap();
/// assert_eq!(matrix.rows(), 3);
/// assert_eq!(matrix.row(2), Some(&[-1.0, 0.0][..]));
///
/// // 5 elements cannot be split into rows of 2
/// assert!(EmbeddingMatrix::new(&data[..5], 2).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddingMatrix<'a> {
    data: &'a [f32],
    rows: usize,
    dim: usize,
}

impl<'a> EmbeddingMatrix<'a> {
    /// View `data` as rows of width `dim`, inferring the row count.
    ///
    /// # Errors
    ///
    /// Returns `VectorOpsError::MatrixShape` if `data.len()` is not a
    /// multiple of `dim`, or if `dim == 0` and `data` is non-empty.
    pub fn new(data: &'a [f32], dim: usize) -> VectorOpsResult<Self> {
        if dim == 0 {
            if data.is_empty() {
                return Ok(Self { data, rows: 0, dim });
            }
            return Err(VectorOpsError::MatrixShape {
                len: data.len(),
                rows: 0,
                dim,
            });
        }
        if data.len() % dim != 0 {
            return Err(VectorOpsError::MatrixShape {
                len: data.len(),
                rows: data.len() / dim,
                dim,
            });
        }
        Ok(Self {
            data,
            rows: data.len() / dim,
            dim,
        })
    }

    /// View `data` as exactly `rows` rows of width `dim`.
    ///
    /// `dim == 0` with any row count is allowed: every row is empty.
    ///
    /// # Errors
    ///
    /// Returns `VectorOpsError::MatrixShape` if `rows * dim` overflows or
    /// differs from `data.len()`.
    pub fn from_parts(data: &'a [f32], rows: usize, dim: usize) -> VectorOpsResult<Self> {
        let shape_error = || VectorOpsError::MatrixShape {
            len: data.len(),
            rows,
            dim,
        };
        let expected = rows.checked_mul(dim).ok_or_else(shape_error)?;
        if data.len() != expected {
            return Err(shape_error());
        }
        Ok(Self { data, rows, dim })
    }

    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Width of each row.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// True when there are no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The flattened backing slice.
    #[inline]
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// Row `index`, or `None` past the end.
    #[inline]
    pub fn row(&self, index: usize) -> Option<&'a [f32]> {
        if index >= self.rows {
            return None;
        }
        let start = index * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    /// Rows in order.
    pub fn iter_rows(&self) -> impl ExactSizeIterator<Item = &'a [f32]> + 'a {
        let (data, dim) = (self.data, self.dim);
        (0..self.rows).map(move |i| &data[i * dim..(i + 1) * dim])
    }
}

/// Rows that met a similarity threshold, in ascending row order.
///
/// `scores[k]` is the score of row `indices[k]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThresholdMatches {
    /// Scores of the surviving rows.
    pub scores: Vec<f32>,
    /// Original row index of each surviving score.
    pub indices: Vec<u32>,
}

impl ThresholdMatches {
    /// Number of surviving rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// True when no row passed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// `(row_index, score)` pairs in ascending row order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.scores.iter().copied())
    }
}
