//! Constants shared by the similarity kernels.

/// Independent f32 accumulators per kernel pass.
///
/// Every backend (portable, AVX2, NEON) uses this exact lane layout so that
/// results are bit-identical regardless of which one runs.
pub const LANES: usize = 8;

/// Rows a thresholded scan can report: indices are `u32`, so `0..=u32::MAX`.
pub const MAX_INDEXED_ROWS: u64 = u32::MAX as u64 + 1;
