//! `tessera info`: what this build will run with.

use clap::Args;
use serde::Serialize;
use tracing::error;

use tessera_vector_ops::config::PARALLEL_AVAILABLE;
use tessera_vector_ops::{has_simd, simd_backend, version, BatchConfig, SimdBackend};

/// Arguments for the info command.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Capability report.
#[derive(Debug, Serialize)]
pub struct InfoReport {
    pub version: &'static str,
    pub backend: SimdBackend,
    pub has_simd: bool,
    pub parallel_compiled: bool,
    pub batch_config: BatchConfig,
}

impl InfoReport {
    pub fn collect() -> Self {
        Self {
            version: version(),
            backend: simd_backend(),
            has_simd: has_simd(),
            parallel_compiled: PARALLEL_AVAILABLE,
            batch_config: BatchConfig::global().clone(),
        }
    }

    fn render_text(&self) -> String {
        let config = &self.batch_config;
        format!(
            "tessera-vector-ops {}\n\
             SIMD backend:      {}\n\
             has_simd:          {}\n\
             rayon compiled in: {}\n\
             parallel:          {}\n\
             min_parallel_rows: {}\n\
             chunk_rows:        {}",
            self.version,
            self.backend,
            self.has_simd,
            self.parallel_compiled,
            config.parallel,
            config.min_parallel_rows,
            config.chunk_rows,
        )
    }
}

/// Execute the info command. Returns the process exit code.
pub fn handle_info(args: InfoArgs) -> i32 {
    let report = InfoReport::collect();

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize info report: {}", e);
                return 1;
            }
        }
    } else {
        println!("{}", report.render_text());
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_matches_library() {
        let report = InfoReport::collect();
        assert_eq!(report.version, version());
        assert_eq!(report.has_simd, report.backend.is_vectorized());
    }

    #[test]
    fn test_report_serializes() {
        let json = serde_json::to_value(InfoReport::collect()).unwrap();
        assert!(json["version"].is_string());
        assert!(json["batch_config"]["chunk_rows"].is_u64());
        let backend = json["backend"].as_str().unwrap();
        assert!(["avx2", "neon", "scalar"].contains(&backend));
    }

    #[test]
    fn test_text_report_names_backend() {
        let report = InfoReport::collect();
        let text = report.render_text();
        assert!(text.contains(&report.backend.to_string()));
        assert!(text.starts_with("tessera-vector-ops "));
    }
}
