//! Tessera CLI
//!
//! Operator tools for the tessera-vector-ops kernels.
//!
//! # Commands
//!
//! - `info`: Version, active SIMD backend and batch settings
//! - `bench`: Time the batch kernel against a naive reference and check
//!   that both agree
//!
//! Exit code 0 on success, 1 on error.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

/// Tessera vector kernels - capability report and benchmark
#[derive(Parser)]
#[command(name = "tessera")]
#[command(version)]
#[command(about = "Capability report and benchmark runner for tessera-vector-ops")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report version, SIMD backend and batch configuration
    Info(commands::info::InfoArgs),
    /// Benchmark batch scoring against a per-row reference
    ///
    /// Generates deterministic normalized embeddings, scores them with the
    /// batch kernel and with a naive loop, and reports timings, speedup
    /// and agreement.
    Bench(commands::bench::BenchArgs),
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Info(args) => commands::info::handle_info(args),
        Commands::Bench(args) => commands::bench::handle_bench(args),
    };

    std::process::exit(exit_code);
}
