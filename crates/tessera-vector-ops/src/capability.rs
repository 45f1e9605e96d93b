//! Build metadata and runtime SIMD detection.
//!
//! The backend is detected once per process and never changes afterwards.
//! It selects how the kernels execute, never what they return: every backend
//! produces bit-identical scores (see [`crate::similarity`]).
//!
//! # Environment Variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `TESSERA_FORCE_SCALAR` | `1`/`true`/`yes`/`on` pins the portable backend |

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Library version reported across the C ABI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable that pins the portable backend.
pub const FORCE_SCALAR_ENV: &str = "TESSERA_FORCE_SCALAR";

/// Kernel backends the similarity engine can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimdBackend {
    /// 256-bit AVX2 registers on `x86_64`.
    Avx2,
    /// Paired 128-bit NEON registers on aarch64.
    Neon,
    /// Portable eight-lane loop.
    Scalar,
}

impl SimdBackend {
    /// Whether this backend uses vector intrinsics.
    #[inline]
    pub const fn is_vectorized(self) -> bool {
        !matches!(self, Self::Scalar)
    }

    /// Short lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Avx2 => "avx2",
            Self::Neon => "neon",
            Self::Scalar => "scalar",
        }
    }
}

impl fmt::Display for SimdBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Avx2 => write!(f, "AVX2"),
            Self::Neon => write!(f, "NEON"),
            Self::Scalar => write!(f, "Scalar"),
        }
    }
}

/// Probe the CPU for the best backend compiled into this build.
///
/// Does not consult [`FORCE_SCALAR_ENV`] and does not cache.
#[must_use]
#[allow(unreachable_code)]
pub fn detect_backend() -> SimdBackend {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        if is_x86_feature_detected!("avx2") {
            return SimdBackend::Avx2;
        }
    }

    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    {
        if std::arch::is_aarch64_feature_detected!("neon") {
            return SimdBackend::Neon;
        }
    }

    SimdBackend::Scalar
}

/// Backend used by every kernel call in this process.
///
/// Detected on first use, then constant.
pub fn simd_backend() -> SimdBackend {
    static BACKEND: OnceLock<SimdBackend> = OnceLock::new();

    *BACKEND.get_or_init(|| {
        let forced = force_scalar_requested();
        let backend = if forced {
            SimdBackend::Scalar
        } else {
            detect_backend()
        };
        info!(
            backend = %backend,
            forced_scalar = forced,
            "tessera vector kernels initialized"
        );
        backend
    })
}

/// Whether the active backend is vectorized.
#[inline]
pub fn has_simd() -> bool {
    simd_backend().is_vectorized()
}

/// Static version string of this build.
#[inline]
pub fn version() -> &'static str {
    VERSION
}

fn force_scalar_requested() -> bool {
    std::env::var(FORCE_SCALAR_ENV)
        .map(|val| matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
