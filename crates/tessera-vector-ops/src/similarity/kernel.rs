//! Accumulation kernels and backend dispatch.
//!
//! # Lane Layout
//!
//! ```text
//! acc[l] = sum over chunks c of f64(x[c*8 + l]) * f64(y[c*8 + l])   (l = 0..8)
//! tail   = sum over the remaining len % 8 elements, in order
//! result = ((acc0+acc4) + (acc2+acc6)) + ((acc1+acc5) + (acc3+acc7)) + tail
//! ```
//!
//! Inputs are widened to f64 before multiplying. The product of two f32
//! values is exact in f64, and f64 sums of squares neither overflow nor
//! underflow for any finite f32 input. Each accumulator is independent of
//! the others. Consequently:
//! - the portable loop, AVX2 and NEON return identical bits;
//! - `sum_sq(a)` equals the `|a|^2` produced by `dot_norms(a, b)`, and
//!   `dot_sq(a, b)` equals its `(dot, |b|^2)`, which is what keeps batch
//!   scores identical to pairwise scores.

use crate::capability::{simd_backend, SimdBackend};

use super::constants::LANES;

/// Fixed reduction tree over the eight lane accumulators.
#[inline(always)]
pub(crate) fn reduce_lanes(acc: &[f64; LANES]) -> f64 {
    let s0 = acc[0] + acc[4];
    let s1 = acc[1] + acc[5];
    let s2 = acc[2] + acc[6];
    let s3 = acc[3] + acc[7];
    (s0 + s2) + (s1 + s3)
}

/// Kernel entry points bound to one backend.
///
/// Only constructible from the detected backend or the portable one, so an
/// intrinsic path is never selected on a CPU that lacks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Kernel {
    backend: SimdBackend,
}

impl Kernel {
    /// Kernel for the process-wide detected backend.
    #[inline]
    pub(crate) fn detect() -> Self {
        Self {
            backend: simd_backend(),
        }
    }

    /// Portable eight-lane kernel.
    #[cfg(test)]
    pub(crate) const fn portable() -> Self {
        Self {
            backend: SimdBackend::Scalar,
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(self) -> SimdBackend {
        self.backend
    }

    /// `|v|^2`.
    #[inline]
    pub(crate) fn sum_sq(self, v: &[f32]) -> f64 {
        match self.backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 => unsafe { super::simd::avx2::sum_sq(v) },
            #[cfg(all(feature = "simd", target_arch = "aarch64"))]
            SimdBackend::Neon => unsafe { super::simd::neon::sum_sq(v) },
            _ => portable::sum_sq(v),
        }
    }

    /// `(a . b, |b|^2)` over the common prefix of `a` and `b`.
    #[inline]
    pub(crate) fn dot_sq(self, a: &[f32], b: &[f32]) -> (f64, f64) {
        let len = a.len().min(b.len());
        let (a, b) = (&a[..len], &b[..len]);
        match self.backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 => unsafe { super::simd::avx2::dot_sq(a, b) },
            #[cfg(all(feature = "simd", target_arch = "aarch64"))]
            SimdBackend::Neon => unsafe { super::simd::neon::dot_sq(a, b) },
            _ => portable::dot_sq(a, b),
        }
    }

    /// `(a . b, |a|^2, |b|^2)` in one pass over the common prefix.
    #[inline]
    pub(crate) fn dot_norms(self, a: &[f32], b: &[f32]) -> (f64, f64, f64) {
        let len = a.len().min(b.len());
        let (a, b) = (&a[..len], &b[..len]);
        match self.backend {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SimdBackend::Avx2 => unsafe { super::simd::avx2::dot_norms(a, b) },
            #[cfg(all(feature = "simd", target_arch = "aarch64"))]
            SimdBackend::Neon => unsafe { super::simd::neon::dot_norms(a, b) },
            _ => portable::dot_norms(a, b),
        }
    }
}

/// Portable implementations. Written lane-by-lane so LLVM can vectorize
/// them without changing the summation order.
pub(crate) mod portable {
    use super::{reduce_lanes, LANES};

    #[inline(always)]
    fn mul(x: f32, y: f32) -> f64 {
        f64::from(x) * f64::from(y)
    }

    pub(crate) fn sum_sq(v: &[f32]) -> f64 {
        let mut acc = [0.0f64; LANES];
        let chunks = v.chunks_exact(LANES);
        let rest = chunks.remainder();

        for c in chunks {
            for l in 0..LANES {
                acc[l] += mul(c[l], c[l]);
            }
        }

        let mut tail = 0.0f64;
        for &x in rest {
            tail += mul(x, x);
        }

        reduce_lanes(&acc) + tail
    }

    pub(crate) fn dot_sq(a: &[f32], b: &[f32]) -> (f64, f64) {
        debug_assert_eq!(a.len(), b.len());
        let mut dot = [0.0f64; LANES];
        let mut b_sq = [0.0f64; LANES];
        let a_chunks = a.chunks_exact(LANES);
        let b_chunks = b.chunks_exact(LANES);
        let (a_rest, b_rest) = (a_chunks.remainder(), b_chunks.remainder());

        for (ca, cb) in a_chunks.zip(b_chunks) {
            for l in 0..LANES {
                dot[l] += mul(ca[l], cb[l]);
                b_sq[l] += mul(cb[l], cb[l]);
            }
        }

        let mut dot_tail = 0.0f64;
        let mut b_tail = 0.0f64;
        for (&x, &y) in a_rest.iter().zip(b_rest) {
            dot_tail += mul(x, y);
            b_tail += mul(y, y);
        }

        (reduce_lanes(&dot) + dot_tail, reduce_lanes(&b_sq) + b_tail)
    }

    pub(crate) fn dot_norms(a: &[f32], b: &[f32]) -> (f64, f64, f64) {
        debug_assert_eq!(a.len(), b.len());
        let mut dot = [0.0f64; LANES];
        let mut a_sq = [0.0f64; LANES];
        let mut b_sq = [0.0f64; LANES];
        let a_chunks = a.chunks_exact(LANES);
        let b_chunks = b.chunks_exact(LANES);
        let (a_rest, b_rest) = (a_chunks.remainder(), b_chunks.remainder());

        for (ca, cb) in a_chunks.zip(b_chunks) {
            for l in 0..LANES {
                dot[l] += mul(ca[l], cb[l]);
                a_sq[l] += mul(ca[l], ca[l]);
                b_sq[l] += mul(cb[l], cb[l]);
            }
        }

        let mut dot_tail = 0.0f64;
        let mut a_tail = 0.0f64;
        let mut b_tail = 0.0f64;
        for (&x, &y) in a_rest.iter().zip(b_rest) {
            dot_tail += mul(x, y);
            a_tail += mul(x, x);
            b_tail += mul(y, y);
        }

        (
            reduce_lanes(&dot) + dot_tail,
            reduce_lanes(&a_sq) + a_tail,
            reduce_lanes(&b_sq) + b_tail,
        )
    }
}
