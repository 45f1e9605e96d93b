//! `tessera bench`: batch kernel vs. naive per-row reference.
//!
//! # Usage
//!
//! ```bash
//! tessera bench --dim 384 --rows 10000 --iterations 20
//! tessera bench --json
//! ```
//!
//! Data is ChaCha8-generated from `--seed` and normalized, so two runs with
//! the same arguments score identical inputs.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, error, info};

use tessera_vector_ops::{
    batch_cosine_similarity_into, batch_similarity_with_threshold, normalize_vector,
    simd_backend, EmbeddingMatrix, SimdBackend,
};

/// Relative tolerance for kernel/reference agreement.
pub const RELATIVE_TOLERANCE: f32 = 1e-5;

/// Absolute floor for scores near zero.
pub const ABSOLUTE_TOLERANCE: f32 = 1e-8;

/// Arguments for the bench command.
#[derive(Args, Debug, Clone)]
pub struct BenchArgs {
    /// Embedding dimension
    #[arg(long, default_value = "384")]
    pub dim: usize,

    /// Number of embeddings to score
    #[arg(long, default_value = "100")]
    pub rows: usize,

    /// Timed repetitions per implementation
    #[arg(long, default_value = "10")]
    pub iterations: u32,

    /// Threshold for the filtered scan
    #[arg(long, default_value = "0.3", allow_hyphen_values = true)]
    pub threshold: f32,

    /// Seed for the data generator
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Benchmark outcome.
#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub backend: SimdBackend,
    pub dim: usize,
    pub rows: usize,
    pub iterations: u32,
    pub kernel_ms: f64,
    pub reference_ms: f64,
    pub speedup: f64,
    pub max_abs_deviation: f32,
    pub agrees: bool,
    pub threshold: f32,
    pub threshold_matches: usize,
}

impl BenchReport {
    fn render_text(&self) -> String {
        let threshold_label = format!("Matches >= {}:", self.threshold);
        format!(
            "Backend:            {}\n\
             Shape:              {} x {}\n\
             Iterations:         {}\n\
             Kernel:             {:.4} ms/iter\n\
             Reference:          {:.4} ms/iter\n\
             Speedup:            {:.2}x\n\
             Max deviation:      {:e}\n\
             Results agree:      {}\n\
             {:<19} {}",
            self.backend,
            self.rows,
            self.dim,
            self.iterations,
            self.kernel_ms,
            self.reference_ms,
            self.speedup,
            self.max_abs_deviation,
            self.agrees,
            threshold_label,
            self.threshold_matches,
        )
    }
}

/// Execute the bench command. Returns the process exit code.
pub fn handle_bench(args: BenchArgs) -> i32 {
    let json = args.json;
    match run_bench(&args) {
        Ok(report) => {
            if json {
                match serde_json::to_string_pretty(&report) {
                    Ok(out) => println!("{}", out),
                    Err(e) => {
                        error!("Failed to serialize bench report: {}", e);
                        return 1;
                    }
                }
            } else {
                println!("{}", report.render_text());
            }
            0
        }
        Err(e) => {
            error!("Benchmark failed: {:#}", e);
            1
        }
    }
}

/// Generate data, time both implementations and compare their output.
pub fn run_bench(args: &BenchArgs) -> Result<BenchReport> {
    if args.dim == 0 {
        bail!("--dim must be at least 1");
    }
    if args.rows == 0 {
        bail!("--rows must be at least 1");
    }
    if args.iterations == 0 {
        bail!("--iterations must be at least 1");
    }
    let len = args
        .rows
        .checked_mul(args.dim)
        .context("--rows * --dim overflows")?;

    info!(
        dim = args.dim,
        rows = args.rows,
        iterations = args.iterations,
        seed = args.seed,
        "generating benchmark data"
    );
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let query = normalized(random_vector(&mut rng, args.dim));
    let mut data = random_vector(&mut rng, len);
    for row in data.chunks_exact_mut(args.dim) {
        normalize_vector(row);
    }
    let matrix = EmbeddingMatrix::new(&data, args.dim).context("building embedding matrix")?;

    let mut kernel_scores = vec![0.0f32; args.rows];
    let kernel_time = time_iterations(args.iterations, || {
        batch_cosine_similarity_into(&query, &matrix, &mut kernel_scores)
    })?;

    let mut reference_scores = vec![0.0f32; args.rows];
    let reference_time = time_iterations(args.iterations, || {
        reference_batch(&query, &matrix, &mut reference_scores);
        Ok::<(), Infallible>(())
    })?;

    let max_abs_deviation = kernel_scores
        .iter()
        .zip(&reference_scores)
        .map(|(k, r)| (k - r).abs())
        .fold(0.0f32, f32::max);
    let agrees = kernel_scores
        .iter()
        .zip(&reference_scores)
        .all(|(&k, &r)| within_tolerance(k, r));

    let matches = batch_similarity_with_threshold(&query, &matrix, args.threshold)
        .context("thresholded scan")?;

    let kernel_ms = per_iteration_ms(kernel_time, args.iterations);
    let reference_ms = per_iteration_ms(reference_time, args.iterations);
    let speedup = if kernel_ms > 0.0 {
        reference_ms / kernel_ms
    } else {
        f64::INFINITY
    };
    debug!(kernel_ms, reference_ms, max_abs_deviation, "benchmark finished");

    Ok(BenchReport {
        backend: simd_backend(),
        dim: args.dim,
        rows: args.rows,
        iterations: args.iterations,
        kernel_ms,
        reference_ms,
        speedup,
        max_abs_deviation,
        agrees,
        threshold: args.threshold,
        threshold_matches: matches.len(),
    })
}

fn random_vector(rng: &mut ChaCha8Rng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn normalized(mut v: Vec<f32>) -> Vec<f32> {
    normalize_vector(&mut v);
    v
}

fn time_iterations<F, E>(iterations: u32, mut f: F) -> Result<Duration>
where
    F: FnMut() -> std::result::Result<(), E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let start = Instant::now();
    for _ in 0..iterations {
        f()?;
    }
    Ok(start.elapsed())
}

fn per_iteration_ms(total: Duration, iterations: u32) -> f64 {
    total.as_secs_f64() * 1000.0 / f64::from(iterations)
}

/// Textbook per-row cosine: three sequential sums, no lanes.
fn reference_batch(query: &[f32], matrix: &EmbeddingMatrix<'_>, out: &mut [f32]) {
    let query_norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
    for (slot, row) in out.iter_mut().zip(matrix.iter_rows()) {
        let dot: f32 = query.iter().zip(row).map(|(a, b)| a * b).sum();
        let row_norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = query_norm * row_norm;
        *slot = if denom == 0.0 { 0.0 } else { dot / denom };
    }
}

fn within_tolerance(actual: f32, expected: f32) -> bool {
    (actual - expected).abs() <= ABSOLUTE_TOLERANCE + RELATIVE_TOLERANCE * expected.abs()
}
