//! Tuning for the batch similarity engine.
//!
//! # Environment Variable Overrides
//!
//! [`BatchConfig::from_env()`] reads:
//!
//! | Field | Environment Variable | Default |
//! |-------|---------------------|---------|
//! | `parallel` | `TESSERA_PARALLEL` | true |
//! | `min_parallel_rows` | `TESSERA_MIN_PARALLEL_ROWS` | 16,384 |
//! | `chunk_rows` | `TESSERA_CHUNK_ROWS` | 2,048 |
//!
//! None of these settings change scores or their order, only how the rows
//! are scheduled.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{VectorOpsError, VectorOpsResult};

/// Rows per scheduling block, sized so a block of 384-D rows stays in L2.
pub const DEFAULT_CHUNK_ROWS: usize = 2048;

/// Below this many rows the rayon fan-out costs more than it saves.
pub const DEFAULT_MIN_PARALLEL_ROWS: usize = 16_384;

/// Whether this build was compiled with the `parallel` feature.
pub const PARALLEL_AVAILABLE: bool = cfg!(feature = "parallel");

/// Batch engine scheduling parameters.
///
/// # Example
///
/// ```
/// use tessera_vector_ops::BatchConfig;
///
/// let config = BatchConfig::default();
/// assert!(config.validate().is_ok());
///
/// let sequential = BatchConfig::sequential();
/// assert!(!sequential.use_parallel(1_000_000, 384));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Allow splitting large batches across the rayon pool.
    ///
    /// Ignored when the crate is built without the `parallel` feature.
    pub parallel: bool,

    /// Minimum row count before the parallel path is taken.
    pub min_parallel_rows: usize,

    /// Rows per scheduling block.
    pub chunk_rows: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            min_parallel_rows: DEFAULT_MIN_PARALLEL_ROWS,
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }
}

impl BatchConfig {
    /// Configuration that always scans on the calling thread.
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("TESSERA_PARALLEL") {
            config.parallel = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes" | "on");
        }

        if let Ok(val) = std::env::var("TESSERA_MIN_PARALLEL_ROWS") {
            if let Ok(rows) = val.trim().parse::<usize>() {
                config.min_parallel_rows = rows;
            }
        }

        if let Ok(val) = std::env::var("TESSERA_CHUNK_ROWS") {
            if let Ok(rows) = val.trim().parse::<usize>() {
                config.chunk_rows = rows;
            }
        }

        config
    }

    /// Process-wide configuration used by the C ABI and the plain batch
    /// functions.
    ///
    /// Read from the environment on first use. An invalid environment falls
    /// back to [`BatchConfig::default`].
    pub fn global() -> &'static BatchConfig {
        static GLOBAL: OnceLock<BatchConfig> = OnceLock::new();

        GLOBAL.get_or_init(|| {
            let config = Self::from_env();
            match config.validate() {
                Ok(()) => config,
                Err(err) => {
                    warn!(error = %err, "ignoring invalid TESSERA_* batch settings");
                    Self::default()
                }
            }
        })
    }

    /// Validate configuration parameters.
    ///
    /// # Errors
    ///
    /// Returns `VectorOpsError::InvalidConfig` if `chunk_rows` or
    /// `min_parallel_rows` is zero.
    pub fn validate(&self) -> VectorOpsResult<()> {
        if self.chunk_rows == 0 {
            return Err(VectorOpsError::InvalidConfig(
                "chunk_rows must be at least 1".to_string(),
            ));
        }
        if self.min_parallel_rows == 0 {
            return Err(VectorOpsError::InvalidConfig(
                "min_parallel_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a batch of `rows` rows of width `dim` goes to the rayon pool.
    #[inline]
    pub fn use_parallel(&self, rows: usize, dim: usize) -> bool {
        PARALLEL_AVAILABLE
            && self.parallel
            && dim > 0
            && self.chunk_rows > 0
            && rows >= self.min_parallel_rows
            && rows > self.chunk_rows
    }
}
