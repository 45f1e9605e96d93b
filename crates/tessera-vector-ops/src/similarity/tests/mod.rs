//! Kernel, pairwise, batch and threshold suites.
//!
//! Generated data comes from a fixed-seed ChaCha8 stream so failures
//! reproduce exactly.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::similarity::kernel::Kernel;

mod batch_tests;
mod kernel_tests;

/// Deterministic RNG for reproducible tests
fn make_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(42)
}

fn random_vector(rng: &mut ChaCha8Rng, dim: usize) -> Vec<f32> {
    (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
}

/// Flattened row-major matrix of `rows` random rows.
fn random_matrix(rng: &mut ChaCha8Rng, rows: usize, dim: usize) -> Vec<f32> {
    random_vector(rng, rows * dim)
}

/// Magnitude whose square overflows f32.
const HUGE: f32 = 1e20;

/// Magnitude whose square underflows f32.
const TINY: f32 = 1e-25;

/// The runtime-selected kernel and the portable one.
fn both_kernels() -> [Kernel; 2] {
    [Kernel::detect(), Kernel::portable()]
}

fn scaled(v: &[f32], factor: f32) -> Vec<f32> {
    v.iter().map(|x| x * factor).collect()
}

/// Rows alternately scaled to `HUGE`, `TINY` and unit range.
fn mixed_scale_matrix(rng: &mut ChaCha8Rng, rows: usize, dim: usize) -> Vec<f32> {
    let mut data = random_matrix(rng, rows, dim);
    for (i, row) in data.chunks_exact_mut(dim.max(1)).enumerate() {
        let factor = [HUGE, TINY, 1.0][i % 3];
        row.iter_mut().for_each(|x| *x *= factor);
    }
    data
}

/// `[HUGE, 0]`, `[0, 1]`, `[TINY, 0]`, `[-HUGE, 0]`.
const EXTREME_AXIS_ROWS: [f32; 8] = [HUGE, 0.0, 0.0, 1.0, TINY, 0.0, -HUGE, 0.0];
