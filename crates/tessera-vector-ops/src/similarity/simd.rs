//! Intrinsic kernels.
//!
//! Both modules mirror `kernel::portable` exactly: eight f64 lanes fed by
//! widened f32 inputs, scalar tail, [`reduce_lanes`](super::kernel::reduce_lanes)
//! for the horizontal sum. An f32 x f32 product is exact in f64, so each
//! lane update rounds once (at the add) on every backend.
//!
//! # Safety
//!
//! Callers must only reach these functions through
//! [`Kernel`](super::kernel::Kernel), which selects them after runtime
//! detection. Pair kernels require `a.len() == b.len()`.

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod avx2 {
    use std::arch::x86_64::*;

    use crate::similarity::constants::LANES;
    use crate::similarity::kernel::reduce_lanes;

    /// Lanes 0..4 in `[0]`, lanes 4..8 in `[1]`.
    type Lanes = [__m256d; 2];

    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn zero() -> Lanes {
        [_mm256_setzero_pd(), _mm256_setzero_pd()]
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn load(p: *const f32) -> Lanes {
        [
            _mm256_cvtps_pd(_mm_loadu_ps(p)),
            _mm256_cvtps_pd(_mm_loadu_ps(p.add(4))),
        ]
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn mul_add(acc: &mut Lanes, x: &Lanes, y: &Lanes) {
        acc[0] = _mm256_add_pd(acc[0], _mm256_mul_pd(x[0], y[0]));
        acc[1] = _mm256_add_pd(acc[1], _mm256_mul_pd(x[1], y[1]));
    }

    #[inline]
    #[target_feature(enable = "avx2")]
    unsafe fn spill(v: &Lanes) -> [f64; LANES] {
        let mut out = [0.0f64; LANES];
        _mm256_storeu_pd(out.as_mut_ptr(), v[0]);
        _mm256_storeu_pd(out.as_mut_ptr().add(4), v[1]);
        out
    }

    #[inline(always)]
    fn mul(x: f32, y: f32) -> f64 {
        f64::from(x) * f64::from(y)
    }

    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn sum_sq(v: &[f32]) -> f64 {
        let chunks = v.len() / LANES;
        let p = v.as_ptr();
        let mut acc = zero();

        for i in 0..chunks {
            let x = load(p.add(i * LANES));
            mul_add(&mut acc, &x, &x);
        }

        let mut tail = 0.0f64;
        for &x in &v[chunks * LANES..] {
            tail += mul(x, x);
        }

        reduce_lanes(&spill(&acc)) + tail
    }

    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn dot_sq(a: &[f32], b: &[f32]) -> (f64, f64) {
        debug_assert_eq!(a.len(), b.len());
        let chunks = a.len() / LANES;
        let (pa, pb) = (a.as_ptr(), b.as_ptr());
        let mut dot = zero();
        let mut b_sq = zero();

        for i in 0..chunks {
            let va = load(pa.add(i * LANES));
            let vb = load(pb.add(i * LANES));
            mul_add(&mut dot, &va, &vb);
            mul_add(&mut b_sq, &vb, &vb);
        }

        let mut dot_tail = 0.0f64;
        let mut b_tail = 0.0f64;
        let start = chunks * LANES;
        for (&x, &y) in a[start..].iter().zip(&b[start..]) {
            dot_tail += mul(x, y);
            b_tail += mul(y, y);
        }

        (
            reduce_lanes(&spill(&dot)) + dot_tail,
            reduce_lanes(&spill(&b_sq)) + b_tail,
        )
    }

    #[target_feature(enable = "avx2")]
    pub(crate) unsafe fn dot_norms(a: &[f32], b: &[f32]) -> (f64, f64, f64) {
        debug_assert_eq!(a.len(), b.len());
        let chunks = a.len() / LANES;
        let (pa, pb) = (a.as_ptr(), b.as_ptr());
        let mut dot = zero();
        let mut a_sq = zero();
        let mut b_sq = zero();

        for i in 0..chunks {
            let va = load(pa.add(i * LANES));
            let vb = load(pb.add(i * LANES));
            mul_add(&mut dot, &va, &vb);
            mul_add(&mut a_sq, &va, &va);
            mul_add(&mut b_sq, &vb, &vb);
        }

        let mut dot_tail = 0.0f64;
        let mut a_tail = 0.0f64;
        let mut b_tail = 0.0f64;
        let start = chunks * LANES;
        for (&x, &y) in a[start..].iter().zip(&b[start..]) {
            dot_tail += mul(x, y);
            a_tail += mul(x, x);
            b_tail += mul(y, y);
        }

        (
            reduce_lanes(&spill(&dot)) + dot_tail,
            reduce_lanes(&spill(&a_sq)) + a_tail,
            reduce_lanes(&spill(&b_sq)) + b_tail,
        )
    }
}

#[cfg(all(feature = "simd", target_arch = "aarch64"))]
pub(crate) mod neon {
    use std::arch::aarch64::*;

    use crate::similarity::constants::LANES;
    use crate::similarity::kernel::reduce_lanes;

    /// Lane pairs (0,1), (2,3), (4,5), (6,7).
    type Lanes = [float64x2_t; 4];

    #[inline]
    #[target_feature(enable = "neon")]
    unsafe fn zero() -> Lanes {
        [vdupq_n_f64(0.0); 4]
    }

    #[inline]
    #[target_feature(enable = "neon")]
    unsafe fn load(p: *const f32) -> Lanes {
        let lo = vld1q_f32(p);
        let hi = vld1q_f32(p.add(4));
        [
            vcvt_f64_f32(vget_low_f32(lo)),
            vcvt_high_f64_f32(lo),
            vcvt_f64_f32(vget_low_f32(hi)),
            vcvt_high_f64_f32(hi),
        ]
    }

    #[inline]
    #[target_feature(enable = "neon")]
    unsafe fn mul_add(acc: &mut Lanes, x: &Lanes, y: &Lanes) {
        for i in 0..4 {
            acc[i] = vaddq_f64(acc[i], vmulq_f64(x[i], y[i]));
        }
    }

    #[inline]
    #[target_feature(enable = "neon")]
    unsafe fn spill(v: &Lanes) -> [f64; LANES] {
        let mut out = [0.0f64; LANES];
        for (i, reg) in v.iter().enumerate() {
            vst1q_f64(out.as_mut_ptr().add(2 * i), *reg);
        }
        out
    }

    #[inline(always)]
    fn mul(x: f32, y: f32) -> f64 {
        f64::from(x) * f64::from(y)
    }

    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn sum_sq(v: &[f32]) -> f64 {
        let chunks = v.len() / LANES;
        let p = v.as_ptr();
        let mut acc = zero();

        for i in 0..chunks {
            let x = load(p.add(i * LANES));
            mul_add(&mut acc, &x, &x);
        }

        let mut tail = 0.0f64;
        for &x in &v[chunks * LANES..] {
            tail += mul(x, x);
        }

        reduce_lanes(&spill(&acc)) + tail
    }

    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn dot_sq(a: &[f32], b: &[f32]) -> (f64, f64) {
        debug_assert_eq!(a.len(), b.len());
        let chunks = a.len() / LANES;
        let (pa, pb) = (a.as_ptr(), b.as_ptr());
        let mut dot = zero();
        let mut b_sq = zero();

        for i in 0..chunks {
            let va = load(pa.add(i * LANES));
            let vb = load(pb.add(i * LANES));
            mul_add(&mut dot, &va, &vb);
            mul_add(&mut b_sq, &vb, &vb);
        }

        let mut dot_tail = 0.0f64;
        let mut b_tail = 0.0f64;
        let start = chunks * LANES;
        for (&x, &y) in a[start..].iter().zip(&b[start..]) {
            dot_tail += mul(x, y);
            b_tail += mul(y, y);
        }

        (
            reduce_lanes(&spill(&dot)) + dot_tail,
            reduce_lanes(&spill(&b_sq)) + b_tail,
        )
    }

    #[target_feature(enable = "neon")]
    pub(crate) unsafe fn dot_norms(a: &[f32], b: &[f32]) -> (f64, f64, f64) {
        debug_assert_eq!(a.len(), b.len());
        let chunks = a.len() / LANES;
        let (pa, pb) = (a.as_ptr(), b.as_ptr());
        let mut dot = zero();
        let mut a_sq = zero();
        let mut b_sq = zero();

        for i in 0..chunks {
            let va = load(pa.add(i * LANES));
            let vb = load(pb.add(i * LANES));
            mul_add(&mut dot, &va, &vb);
            mul_add(&mut a_sq, &va, &va);
            mul_add(&mut b_sq, &vb, &vb);
        }

        let mut dot_tail = 0.0f64;
        let mut a_tail = 0.0f64;
        let mut b_tail = 0.0f64;
        let start = chunks * LANES;
        for (&x, &y) in a[start..].iter().zip(&b[start..]) {
            dot_tail += mul(x, y);
            a_tail += mul(x, x);
            b_tail += mul(y, y);
        }

        (
            reduce_lanes(&spill(&dot)) + dot_tail,
            reduce_lanes(&spill(&a_sq)) + a_tail,
            reduce_lanes(&spill(&b_sq)) + b_tail,
        )
    }
}
