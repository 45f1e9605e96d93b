//! Batch cosine similarity and thresholded compaction.
//!
//! # Algorithm
//!
//! ```text
//! |q|      = sqrt(sum_sq(q))                 once per call
//! for each row r (in order):
//!     (dot, |r|^2) = dot_sq(q, r)            one fused pass per row
//!     score[r]     = score_from_parts(dot, |q|, sqrt(|r|^2))
//! ```
//!
//! The per-row arithmetic is the pairwise arithmetic with the query's lane
//! sums hoisted out, so `batch[i] == cosine_similarity(q, row_i)` exactly.
//!
//! # Scheduling
//!
//! Large batches are split into blocks of `chunk_rows` rows on the rayon
//! pool (feature `parallel`). Each row is scored independently and blocks
//! are reassembled in order, so thread count never changes the output.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
#[cfg(feature = "parallel")]
use tracing::debug;

use crate::config::BatchConfig;
use crate::error::{VectorOpsError, VectorOpsResult};

use super::constants::MAX_INDEXED_ROWS;
use super::cpu::score_from_parts;
use super::kernel::Kernel;
use super::types::{EmbeddingMatrix, ThresholdMatches};

/// Score every row of `matrix` against `query` into `out[..rows]`.
///
/// Uses [`BatchConfig::global`] for scheduling.
///
/// # Errors
///
/// - `DimensionMismatch` if `query.len() != matrix.dim()`
/// - `OutputTooSmall` if `out.len() < matrix.rows()`
///
/// # Example
///
/// ```
/// use tessera_vector_ops::{batch_cosine_similarity_into, EmbeddingMatrix};
///
/// let embeddings = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
/// let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
/// let mut scores = [0.0f32; 3];
///
/// batch_cosine_similarity_into(&[1.0, 0.0], &matrix, &mut scores).unwrap();
/// assert_eq!(scores, [1.0, 0.0, -1.0]);
/// ```
pub fn batch_cosine_similarity_into(
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    out: &mut [f32],
) -> VectorOpsResult<()> {
    batch_cosine_similarity_into_with(BatchConfig::global(), query, matrix, out)
}

/// [`batch_cosine_similarity_into`] with explicit scheduling.
pub fn batch_cosine_similarity_into_with(
    config: &BatchConfig,
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    out: &mut [f32],
) -> VectorOpsResult<()> {
    check_query(query, matrix)?;
    check_output("results", out.len(), matrix.rows())?;

    score_rows(config, Kernel::detect(), query, matrix, &mut out[..matrix.rows()]);
    Ok(())
}

/// Score every row, returning an owned vector in row order.
pub fn batch_cosine_similarity(
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
) -> VectorOpsResult<Vec<f32>> {
    batch_cosine_similarity_with(BatchConfig::global(), query, matrix)
}

/// [`batch_cosine_similarity`] with explicit scheduling.
pub fn batch_cosine_similarity_with(
    config: &BatchConfig,
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
) -> VectorOpsResult<Vec<f32>> {
    let mut out = vec![0.0f32; matrix.rows()];
    batch_cosine_similarity_into_with(config, query, matrix, &mut out)?;
    Ok(out)
}

/// Write the rows scoring `>= threshold` into `scores`/`indices`, in row
/// order, and return how many were written.
///
/// Slots past the returned count are not touched. NaN scores never pass;
/// a NaN threshold passes nothing.
///
/// # Errors
///
/// - `DimensionMismatch` if `query.len() != matrix.dim()`
/// - `IndexOverflow` if the matrix has more than 2^32 rows
/// - `OutputTooSmall` if either buffer is shorter than `matrix.rows()`
///
/// # Example
///
/// ```
/// use tessera_vector_ops::{batch_similarity_with_threshold_into, EmbeddingMatrix};
///
/// let embeddings = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
/// let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
/// let mut scores = [f32::NAN; 3];
/// let mut indices = [u32::MAX; 3];
///
/// let count = batch_similarity_with_threshold_into(
///     &[1.0, 0.0], &matrix, 0.0, &mut scores, &mut indices,
/// ).unwrap();
///
/// assert_eq!(count, 2);
/// assert_eq!(&indices[..count], &[0, 1]);
/// assert_eq!(&scores[..count], &[1.0, 0.0]);
/// assert_eq!(indices[2], u32::MAX); // untouched
/// ```
pub fn batch_similarity_with_threshold_into(
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    threshold: f32,
    scores: &mut [f32],
    indices: &mut [u32],
) -> VectorOpsResult<usize> {
    batch_similarity_with_threshold_into_with(
        BatchConfig::global(),
        query,
        matrix,
        threshold,
        scores,
        indices,
    )
}

/// [`batch_similarity_with_threshold_into`] with explicit scheduling.
pub fn batch_similarity_with_threshold_into_with(
    config: &BatchConfig,
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    threshold: f32,
    scores: &mut [f32],
    indices: &mut [u32],
) -> VectorOpsResult<usize> {
    check_query(query, matrix)?;
    check_index_range(matrix.rows())?;
    check_output("results", scores.len(), matrix.rows())?;
    check_output("indices", indices.len(), matrix.rows())?;

    Ok(filter_rows(
        config,
        Kernel::detect(),
        query,
        matrix,
        threshold,
        scores,
        indices,
    ))
}

/// Thresholded scan returning owned, compacted results.
pub fn batch_similarity_with_threshold(
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    threshold: f32,
) -> VectorOpsResult<ThresholdMatches> {
    batch_similarity_with_threshold_with(BatchConfig::global(), query, matrix, threshold)
}

/// [`batch_similarity_with_threshold`] with explicit scheduling.
pub fn batch_similarity_with_threshold_with(
    config: &BatchConfig,
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    threshold: f32,
) -> VectorOpsResult<ThresholdMatches> {
    let rows = matrix.rows();
    let mut scores = vec![0.0f32; rows];
    let mut indices = vec![0u32; rows];

    let count = batch_similarity_with_threshold_into_with(
        config,
        query,
        matrix,
        threshold,
        &mut scores,
        &mut indices,
    )?;

    scores.truncate(count);
    indices.truncate(count);
    Ok(ThresholdMatches { scores, indices })
}

fn check_query(query: &[f32], matrix: &EmbeddingMatrix<'_>) -> VectorOpsResult<()> {
    if query.len() != matrix.dim() {
        return Err(VectorOpsError::DimensionMismatch {
            expected: matrix.dim(),
            actual: query.len(),
        });
    }
    Ok(())
}

fn check_output(buffer: &'static str, actual: usize, required: usize) -> VectorOpsResult<()> {
    if actual < required {
        return Err(VectorOpsError::OutputTooSmall {
            buffer,
            required,
            actual,
        });
    }
    Ok(())
}

fn check_index_range(rows: usize) -> VectorOpsResult<()> {
    if rows as u64 > MAX_INDEXED_ROWS {
        return Err(VectorOpsError::IndexOverflow {
            rows,
            max: MAX_INDEXED_ROWS,
        });
    }
    Ok(())
}

#[inline(always)]
fn score_row(kernel: Kernel, query: &[f32], query_magnitude: f64, row: &[f32]) -> f32 {
    let (dot, row_sq) = kernel.dot_sq(query, row);
    score_from_parts(dot, query_magnitude, row_sq.sqrt())
}

/// Fill `out` (exactly `matrix.rows()` long) with one score per row.
pub(crate) fn score_rows(
    config: &BatchConfig,
    kernel: Kernel,
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    out: &mut [f32],
) {
    debug_assert_eq!(out.len(), matrix.rows());
    let query_magnitude = kernel.sum_sq(query).sqrt();

    #[cfg(feature = "parallel")]
    {
        if config.use_parallel(matrix.rows(), matrix.dim()) {
            score_rows_parallel(config, kernel, query, query_magnitude, matrix, out);
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = config;

    for (slot, row) in out.iter_mut().zip(matrix.iter_rows()) {
        *slot = score_row(kernel, query, query_magnitude, row);
    }
}

#[cfg(feature = "parallel")]
fn score_rows_parallel(
    config: &BatchConfig,
    kernel: Kernel,
    query: &[f32],
    query_magnitude: f64,
    matrix: &EmbeddingMatrix<'_>,
    out: &mut [f32],
) {
    let dim = matrix.dim();
    let chunk_rows = config.chunk_rows;
    debug!(rows = matrix.rows(), dim, chunk_rows, "scoring batch on rayon pool");

    out.par_chunks_mut(chunk_rows)
        .zip(matrix.as_slice().par_chunks(chunk_rows.saturating_mul(dim)))
        .for_each(|(out_block, block)| {
            for (slot, row) in out_block.iter_mut().zip(block.chunks_exact(dim)) {
                *slot = score_row(kernel, query, query_magnitude, row);
            }
        });
}

/// Stable compaction of rows scoring `>= threshold`. Returns the count.
pub(crate) fn filter_rows(
    config: &BatchConfig,
    kernel: Kernel,
    query: &[f32],
    matrix: &EmbeddingMatrix<'_>,
    threshold: f32,
    scores: &mut [f32],
    indices: &mut [u32],
) -> usize {
    let query_magnitude = kernel.sum_sq(query).sqrt();

    #[cfg(feature = "parallel")]
    {
        if config.use_parallel(matrix.rows(), matrix.dim()) {
            return filter_rows_parallel(
                config,
                kernel,
                query,
                query_magnitude,
                matrix,
                threshold,
                scores,
                indices,
            );
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = config;

    let mut count = 0;
    for (index, row) in matrix.iter_rows().enumerate() {
        let score = score_row(kernel, query, query_magnitude, row);
        if score >= threshold {
            scores[count] = score;
            indices[count] = index as u32;
            count += 1;
        }
    }
    count
}

#[cfg(feature = "parallel")]
#[allow(clippy::too_many_arguments)]
fn filter_rows_parallel(
    config: &BatchConfig,
    kernel: Kernel,
    query: &[f32],
    query_magnitude: f64,
    matrix: &EmbeddingMatrix<'_>,
    threshold: f32,
    scores: &mut [f32],
    indices: &mut [u32],
) -> usize {
    let dim = matrix.dim();
    let chunk_rows = config.chunk_rows;
    debug!(
        rows = matrix.rows(),
        dim,
        chunk_rows,
        threshold,
        "filtering batch on rayon pool"
    );

    // Survivors per block, blocks kept in row order by the indexed collect.
    let blocks: Vec<Vec<(u32, f32)>> = matrix
        .as_slice()
        .par_chunks(chunk_rows.saturating_mul(dim))
        .enumerate()
        .map(|(block_index, block)| {
            let base = block_index * chunk_rows;
            block
                .chunks_exact(dim)
                .enumerate()
                .filter_map(|(offset, row)| {
                    let score = score_row(kernel, query, query_magnitude, row);
                    (score >= threshold).then_some(((base + offset) as u32, score))
                })
                .collect()
        })
        .collect();

    let mut count = 0;
    for (index, score) in blocks.into_iter().flatten() {
        scores[count] = score;
        indices[count] = index;
        count += 1;
    }
    count
}
