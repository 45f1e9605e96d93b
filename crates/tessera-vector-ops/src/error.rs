//! Error types for the safe vector-ops surface.
//!
//! The C ABI never reports these; shape violations there are caller UB.
//! Rust callers get them as values instead.

use thiserror::Error;

/// Shape and configuration errors for vector operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorOpsError {
    /// Two vectors that must share a length do not.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Flattened matrix length does not equal `rows * dim`.
    #[error("Invalid matrix shape: {len} elements cannot hold {rows} rows of dimension {dim}")]
    MatrixShape { len: usize, rows: usize, dim: usize },

    /// Caller-provided output buffer is shorter than the row count.
    #[error("Output buffer `{buffer}` too small: need {required} slots, got {actual}")]
    OutputTooSmall {
        buffer: &'static str,
        required: usize,
        actual: usize,
    },

    /// Row count exceeds what a `u32` result index can address.
    #[error("Row count {rows} exceeds the {max} rows addressable by a u32 index")]
    IndexOverflow { rows: usize, max: u64 },

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for vector operations.
pub type VectorOpsResult<T> = Result<T, VectorOpsError>;
