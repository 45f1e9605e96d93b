//! C ABI exports.
//!
//! The only place raw pointers become slices. Everything below delegates to
//! the safe functions in [`crate::similarity`]; declarations for C callers
//! live in `include/tessera_vector_ops.h`.
//!
//! # Safety
//!
//! This is a precondition-contract surface. Callers must guarantee:
//! - every non-zero-length pointer is valid for the stated element count
//! - `vec1`/`vec2` hold `len` elements; `query` holds `dim`
//! - `embeddings` holds `num_embeddings * dim` elements, row-major
//! - `results` (and `indices`) hold at least `num_embeddings` slots
//! - output buffers do not alias inputs
//!
//! Violations are undefined behavior and are not detected. A zero length
//! never dereferences its pointer, so null is accepted there. The only
//! conditions checked are arithmetic (`num_embeddings * dim` overflowing,
//! or more rows than a `u32` index can name); those are logged and the
//! call writes nothing.

use std::os::raw::{c_char, c_int};
use std::slice;

use tracing::error;

use crate::capability;
use crate::config::BatchConfig;
use crate::similarity::{self, EmbeddingMatrix, MAX_INDEXED_ROWS};

/// NUL-terminated copy of the crate version with static lifetime.
static VERSION_CSTR: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// # Safety
///
/// `ptr` must be valid for `len` reads when `len > 0`.
#[inline]
unsafe fn slice_from_raw<'a, T>(ptr: *const T, len: usize) -> &'a [T] {
    if len == 0 {
        return &[];
    }
    slice::from_raw_parts(ptr, len)
}

/// # Safety
///
/// `ptr` must be valid for `len` writes when `len > 0` and not aliased.
#[inline]
unsafe fn slice_from_raw_mut<'a, T>(ptr: *mut T, len: usize) -> &'a mut [T] {
    if len == 0 {
        return &mut [];
    }
    slice::from_raw_parts_mut(ptr, len)
}

/// Wrap the embedding buffer, or `None` if `num_embeddings * dim` overflows.
///
/// # Safety
///
/// See the module docs.
unsafe fn matrix_from_raw<'a>(
    embeddings: *const f32,
    num_embeddings: usize,
    dim: usize,
) -> Option<EmbeddingMatrix<'a>> {
    let Some(len) = num_embeddings.checked_mul(dim) else {
        error!(num_embeddings, dim, "embedding matrix size overflows usize");
        return None;
    };
    let data = slice_from_raw(embeddings, len);
    match EmbeddingMatrix::from_parts(data, num_embeddings, dim) {
        Ok(matrix) => Some(matrix),
        Err(err) => {
            error!(error = %err, "rejected embedding matrix");
            None
        }
    }
}

/// Cosine similarity of two `len`-element vectors, in \[-1, 1\].
///
/// Returns `0.0` if either vector has zero magnitude.
///
/// # Safety
///
/// `vec1` and `vec2` must each be valid for `len` reads.
#[no_mangle]
pub unsafe extern "C" fn cosine_similarity(vec1: *const f32, vec2: *const f32, len: usize) -> f32 {
    let a = slice_from_raw(vec1, len);
    let b = slice_from_raw(vec2, len);
    similarity::cosine_similarity_unchecked(a, b)
}

/// Score every row of `embeddings` against `query` into `results[..num_embeddings]`.
///
/// # Safety
///
/// See the module docs.
#[no_mangle]
pub unsafe extern "C" fn batch_cosine_similarity(
    query: *const f32,
    embeddings: *const f32,
    num_embeddings: usize,
    dim: usize,
    results: *mut f32,
) {
    let Some(matrix) = matrix_from_raw(embeddings, num_embeddings, dim) else {
        return;
    };
    let query = slice_from_raw(query, dim);
    let out = slice_from_raw_mut(results, num_embeddings);

    if let Err(err) =
        similarity::batch_cosine_similarity_into_with(BatchConfig::global(), query, &matrix, out)
    {
        error!(error = %err, "batch_cosine_similarity rejected its arguments");
    }
}

/// Write rows scoring `>= threshold` into `results`/`indices` in row order.
///
/// Returns the number written; slots past it are untouched. Returns `0`
/// without writing when `num_embeddings` exceeds 2^32.
///
/// # Safety
///
/// See the module docs.
#[no_mangle]
pub unsafe extern "C" fn batch_similarity_with_threshold(
    query: *const f32,
    embeddings: *const f32,
    num_embeddings: usize,
    dim: usize,
    threshold: f32,
    results: *mut f32,
    indices: *mut u32,
) -> usize {
    if num_embeddings as u64 > MAX_INDEXED_ROWS {
        error!(
            num_embeddings,
            max = MAX_INDEXED_ROWS,
            "too many rows for u32 result indices"
        );
        return 0;
    }
    let Some(matrix) = matrix_from_raw(embeddings, num_embeddings, dim) else {
        return 0;
    };
    let query = slice_from_raw(query, dim);
    let scores = slice_from_raw_mut(results, num_embeddings);
    let indices = slice_from_raw_mut(indices, num_embeddings);

    match similarity::batch_similarity_with_threshold_into_with(
        BatchConfig::global(),
        query,
        &matrix,
        threshold,
        scores,
        indices,
    ) {
        Ok(count) => count,
        Err(err) => {
            error!(error = %err, "batch_similarity_with_threshold rejected its arguments");
            0
        }
    }
}

/// Rescale `vec` in place to unit length. No-op for zero magnitude.
///
/// # Safety
///
/// `vec` must be valid for `len` reads and writes.
#[no_mangle]
pub unsafe extern "C" fn normalize_vector(vec: *mut f32, len: usize) {
    similarity::normalize_vector(slice_from_raw_mut(vec, len));
}

/// Euclidean norm of a `len`-element vector.
///
/// # Safety
///
/// `vec` must be valid for `len` reads.
#[no_mangle]
pub unsafe extern "C" fn vector_magnitude(vec: *const f32, len: usize) -> f32 {
    similarity::vector_magnitude(slice_from_raw(vec, len))
}

/// Static NUL-terminated version string. Never free it.
#[no_mangle]
pub extern "C" fn tessera_vector_ops_version() -> *const c_char {
    VERSION_CSTR.as_ptr().cast::<c_char>()
}

/// `1` if the active kernels are vectorized, else `0`. Informational only.
#[no_mangle]
pub extern "C" fn tessera_has_simd() -> c_int {
    c_int::from(capability::has_simd())
}
