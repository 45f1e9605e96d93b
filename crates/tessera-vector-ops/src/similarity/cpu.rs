//! Pairwise primitives: cosine similarity, magnitude, normalization.
//!
//! # Formula
//!
//! ```text
//! cos(a, b) = clamp(dot(a, b) / (sqrt(|a|^2) * sqrt(|b|^2)), -1, 1)
//! ```
//!
//! Sums, square roots and the division run in f64, so any finite f32
//! input scores correctly; only the final score is rounded to f32. A zero
//! denominator (zero or empty vector) yields exactly `0.0`, never NaN.

use crate::error::{VectorOpsError, VectorOpsResult};

use super::kernel::Kernel;

/// Combine accumulated parts into a score.
///
/// Shared by the pairwise and batch paths so both round identically.
#[inline(always)]
pub(crate) fn score_from_parts(dot: f64, magnitude_a: f64, magnitude_b: f64) -> f32 {
    let denom = magnitude_a * magnitude_b;
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Cosine similarity between two equal-length vectors.
///
/// # Errors
///
/// Returns `VectorOpsError::DimensionMismatch` if the lengths differ.
///
/// # Example
///
/// ```
/// use tessera_vector_ops::cosine_similarity;
///
/// let sim = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap();
/// assert_eq!(sim, 0.0);
///
/// // Zero vectors score 0.0 rather than NaN
/// assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> VectorOpsResult<f32> {
    if a.len() != b.len() {
        return Err(VectorOpsError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(cosine_similarity_unchecked(a, b))
}

/// Cosine similarity without the length check.
///
/// Lengths must match; in release builds a mismatch scores the common
/// prefix only.
#[inline]
pub fn cosine_similarity_unchecked(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine_similarity length mismatch");
    cosine_with(Kernel::detect(), a, b)
}

#[inline]
pub(crate) fn cosine_with(kernel: Kernel, a: &[f32], b: &[f32]) -> f32 {
    let (dot, a_sq, b_sq) = kernel.dot_norms(a, b);
    score_from_parts(dot, a_sq.sqrt(), b_sq.sqrt())
}

/// Euclidean norm. An empty vector has magnitude `0.0`.
///
/// Computed in f64 and rounded once; a norm beyond `f32::MAX` is infinite.
///
/// # Example
///
/// ```
/// use tessera_vector_ops::vector_magnitude;
///
/// assert_eq!(vector_magnitude(&[3.0, 4.0]), 5.0);
/// assert_eq!(vector_magnitude(&[]), 0.0);
/// ```
#[inline]
pub fn vector_magnitude(v: &[f32]) -> f32 {
    magnitude_with(Kernel::detect(), v) as f32
}

#[inline]
pub(crate) fn magnitude_with(kernel: Kernel, v: &[f32]) -> f64 {
    kernel.sum_sq(v).sqrt()
}

/// Rescale `v` in place to unit length.
///
/// Leaves `v` untouched when its magnitude is zero or not finite, so the
/// output never fills with NaN. Vectors with components near `f32::MAX`
/// or in the subnormal range still normalize.
///
/// # Example
///
/// ```
/// use tessera_vector_ops::normalize_vector;
///
/// let mut v = [3.0, 4.0];
/// normalize_vector(&mut v);
/// assert!((v[0] - 0.6).abs() < 1e-6 && (v[1] - 0.8).abs() < 1e-6);
///
/// let mut zero = [0.0, 0.0];
/// normalize_vector(&mut zero);
/// assert_eq!(zero, [0.0, 0.0]);
/// ```
pub fn normalize_vector(v: &mut [f32]) {
    normalize_with(Kernel::detect(), v);
}

pub(crate) fn normalize_with(kernel: Kernel, v: &mut [f32]) {
    let magnitude = magnitude_with(kernel, v);
    if magnitude == 0.0 || !magnitude.is_finite() {
        return;
    }
    for x in v.iter_mut() {
        *x = (f64::from(*x) / magnitude) as f32;
    }
}
