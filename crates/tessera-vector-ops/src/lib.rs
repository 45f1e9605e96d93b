#![deny(deprecated)]

//! Dense cosine-similarity kernels for embedding search.
//!
//! This crate provides:
//! - Pairwise cosine similarity, L2 magnitude and in-place normalization
//! - Batch scoring of one query against a row-major embedding matrix
//! - Thresholded batch scoring with stable, order-preserving compaction
//! - A flat C ABI ([`ffi`]) for host-language bindings
//!
//! # Determinism
//!
//! Scores do not depend on the SIMD backend, the thread count or the call
//! route: `batch[i]` equals `cosine_similarity(query, row_i)` bit for bit.
//! See [`similarity`] for the lane layout that guarantees this.
//!
//! # Cargo Features
//!
//! - `simd` (default): runtime-detected AVX2 / NEON kernels
//! - `parallel` (default): rayon fan-out for large batches
//!
//! # Example
//!
//! ```
//! use tessera_vector_ops::{batch_similarity_with_threshold, EmbeddingMatrix};
//!
//! let embeddings = [1.0, 0.0, 0.0, 1.0, -1.0, 0.0];
//! let matrix = EmbeddingMatrix::new(&embeddings, 2).unwrap();
//!
//! let matches = batch_similarity_with_threshold(&[1.0, 0.0], &matrix, 0.0).unwrap();
//! assert_eq!(matches.indices, vec![0, 1]);
//! assert_eq!(matches.scores, vec![1.0, 0.0]);
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod ffi;
pub mod similarity;

pub use capability::{has_simd, simd_backend, version, SimdBackend, VERSION};
pub use config::BatchConfig;
pub use error::{VectorOpsError, VectorOpsResult};
pub use similarity::{
    batch_cosine_similarity, batch_cosine_similarity_into, batch_cosine_similarity_into_with,
    batch_cosine_similarity_with, batch_similarity_with_threshold,
    batch_similarity_with_threshold_into, batch_similarity_with_threshold_into_with,
    batch_similarity_with_threshold_with, cosine_similarity, cosine_similarity_unchecked,
    normalize_vector, vector_magnitude, EmbeddingMatrix, ThresholdMatches,
};
