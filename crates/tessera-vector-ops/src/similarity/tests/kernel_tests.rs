//! Lane kernels: backend agreement and shared-accumulator identities.

use super::{make_rng, random_vector};
use crate::similarity::kernel::{portable, reduce_lanes, Kernel};

/// Lengths straddling every remainder of the eight-lane layout.
const LENGTHS: [usize; 12] = [0, 1, 3, 7, 8, 9, 15, 16, 17, 100, 384, 1536];

#[test]
fn test_reduce_lanes_sums_all_lanes() {
    let acc = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
    assert_eq!(reduce_lanes(&acc), 36.0);
    assert_eq!(reduce_lanes(&[0.0; 8]), 0.0);
}

#[test]
fn test_detected_kernel_is_bit_identical_to_portable() {
    let mut rng = make_rng();
    let detected = Kernel::detect();
    let scalar = Kernel::portable();

    for len in LENGTHS {
        let a = random_vector(&mut rng, len);
        let b = random_vector(&mut rng, len);

        assert_eq!(
            detected.sum_sq(&a).to_bits(),
            scalar.sum_sq(&a).to_bits(),
            "sum_sq differs at len {} on {:?}",
            len,
            detected.backend()
        );

        let (d0, s0) = detected.dot_sq(&a, &b);
        let (d1, s1) = scalar.dot_sq(&a, &b);
        assert_eq!(d0.to_bits(), d1.to_bits(), "dot_sq.dot differs at len {}", len);
        assert_eq!(s0.to_bits(), s1.to_bits(), "dot_sq.sq differs at len {}", len);

        let (d0, a0, b0) = detected.dot_norms(&a, &b);
        let (d1, a1, b1) = scalar.dot_norms(&a, &b);
        assert_eq!(d0.to_bits(), d1.to_bits(), "dot_norms.dot differs at len {}", len);
        assert_eq!(a0.to_bits(), a1.to_bits(), "dot_norms.a differs at len {}", len);
        assert_eq!(b0.to_bits(), b1.to_bits(), "dot_norms.b differs at len {}", len);
    }
}

#[test]
fn test_fused_pass_matches_split_passes() {
    let mut rng = make_rng();
    let kernel = Kernel::detect();

    for len in LENGTHS {
        let a = random_vector(&mut rng, len);
        let b = random_vector(&mut rng, len);

        let (dot, a_sq, b_sq) = kernel.dot_norms(&a, &b);
        let (split_dot, split_b_sq) = kernel.dot_sq(&a, &b);
        let split_a_sq = kernel.sum_sq(&a);

        assert_eq!(dot.to_bits(), split_dot.to_bits(), "len {}", len);
        assert_eq!(a_sq.to_bits(), split_a_sq.to_bits(), "len {}", len);
        assert_eq!(b_sq.to_bits(), split_b_sq.to_bits(), "len {}", len);
    }
}

#[test]
fn test_portable_values() {
    let a: Vec<f32> = (1..=10).map(|x| x as f32).collect();
    let b = vec![1.0f32; 10];

    // 1^2 + ... + 10^2
    assert_eq!(portable::sum_sq(&a), 385.0);

    let (dot, b_sq) = portable::dot_sq(&a, &b);
    assert_eq!(dot, 55.0);
    assert_eq!(b_sq, 10.0);

    let (dot, a_sq, b_sq) = portable::dot_norms(&a, &b);
    assert_eq!((dot, a_sq, b_sq), (55.0, 385.0, 10.0));
}

#[test]
fn test_pair_kernels_use_common_prefix() {
    let kernel = Kernel::detect();
    let a = [1.0f32, 2.0, 3.0];
    let b = [1.0f32, 1.0];

    assert_eq!(kernel.dot_sq(&a, &b), (3.0, 2.0));
    assert_eq!(kernel.dot_norms(&a, &b), (3.0, 5.0, 2.0));
}

#[test]
fn test_empty_inputs_sum_to_zero() {
    let kernel = Kernel::detect();
    assert_eq!(kernel.sum_sq(&[]), 0.0);
    assert_eq!(kernel.dot_sq(&[], &[]), (0.0, 0.0));
    assert_eq!(kernel.dot_norms(&[], &[]), (0.0, 0.0, 0.0));
}

// ========== Extreme Magnitudes ==========

#[test]
fn test_squares_do_not_overflow_or_underflow() {
    for kernel in super::both_kernels() {
        let huge = f64::from(super::HUGE);
        let sum = kernel.sum_sq(&[super::HUGE; 8]);
        assert!(sum.is_finite(), "{:?}", kernel.backend());
        assert_eq!(sum, 8.0 * huge * huge);

        let tiny = kernel.sum_sq(&[super::TINY; 3]);
        assert!(tiny > 0.0, "{:?}", kernel.backend());

        let top = kernel.sum_sq(&[f32::MAX; 17]);
        assert!(top.is_finite());

        let subnormal = kernel.sum_sq(&[1e-40]);
        assert!(subnormal > 0.0);
    }
}

#[test]
fn test_detected_matches_portable_at_extreme_scales() {
    let mut rng = make_rng();
    let detected = Kernel::detect();
    let scalar = Kernel::portable();

    for factor in [super::HUGE, super::TINY, f32::MAX / 2.0] {
        for len in LENGTHS {
            let a = super::scaled(&random_vector(&mut rng, len), factor);
            let b = super::scaled(&random_vector(&mut rng, len), factor);

            let (d0, a0, b0) = detected.dot_norms(&a, &b);
            let (d1, a1, b1) = scalar.dot_norms(&a, &b);
            assert_eq!(d0.to_bits(), d1.to_bits(), "x{} len {}", factor, len);
            assert_eq!(a0.to_bits(), a1.to_bits(), "x{} len {}", factor, len);
            assert_eq!(b0.to_bits(), b1.to_bits(), "x{} len {}", factor, len);
            assert_eq!(detected.sum_sq(&a).to_bits(), a0.to_bits());
            assert!(a0.is_finite());
        }
    }
}
