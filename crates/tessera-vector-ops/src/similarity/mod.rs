//! Dense cosine-similarity engine.
//!
//! Layered as a straight call-down with no shared state:
//!
//! ```text
//! thresholded batch -> batch -> pairwise arithmetic -> lane kernels
//! ```
//!
//! # Numeric Contract
//!
//! - Accumulation, square roots and division in f64; any finite f32 input
//!   scores correctly, the result is rounded to f32 once
//! - Score in \[-1.0, 1.0\]; `0.0` whenever either magnitude is zero
//! - `batch[i]` is bit-identical to `cosine_similarity(query, row_i)`
//! - Results are bit-identical across the AVX2, NEON and portable kernels,
//!   and across thread counts
//! - Threshold comparison is inclusive (`score >= threshold`)
//!
//! # Module Structure
//!
//! - [`constants`]: Lane count and index limits
//! - `kernel`: Lane-accumulation kernels and backend dispatch
//! - `simd`: AVX2 / NEON versions of the kernels
//! - `cpu`: Pairwise cosine, magnitude, normalization
//! - `batch`: Batch and thresholded batch engines
//! - `types`: [`EmbeddingMatrix`] and [`ThresholdMatches`]

pub mod constants;

mod batch;
mod cpu;
mod kernel;
mod simd;
mod types;

#[cfg(test)]
mod tests;

pub use constants::{LANES, MAX_INDEXED_ROWS};

pub use cpu::{cosine_similarity, cosine_similarity_unchecked, normalize_vector, vector_magnitude};

pub use batch::{
    batch_cosine_similarity, batch_cosine_similarity_into, batch_cosine_similarity_into_with,
    batch_cosine_similarity_with, batch_similarity_with_threshold,
    batch_similarity_with_threshold_into, batch_similarity_with_threshold_into_with,
    batch_similarity_with_threshold_with,
};

pub use types::{EmbeddingMatrix, ThresholdMatches};
