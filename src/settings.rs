//! Pipeline Cache Settings
//!
//! Runtime configuration for the pipeline cache and its background compiler.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pipeline_forge::PipelineSettings;
//!
//! // Defaults: state cache enabled, worker count derived from the host
//! let settings = PipelineSettings::default();
//!
//! // Loaded from a JSON config blob, then patched from the environment
//! let mut settings = PipelineSettings::from_json(r#"{ "num_compiler_threads": 2 }"#)?;
//! settings.apply_env_overrides();
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Environment variable that disables the persistent state cache when set to `0`.
pub const ENV_STATE_CACHE: &str = "PIPELINE_FORGE_STATE_CACHE";

/// Environment variable that overrides the compiler thread count.
pub const ENV_COMPILER_THREADS: &str = "PIPELINE_FORGE_COMPILER_THREADS";

/// Configuration shared by every pipeline created through a
/// [`PipelineContext`](crate::PipelineContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Forward every successfully built state vector to the state cache
    /// writer so it can be replayed on the next run.
    pub enable_state_cache: bool,

    /// Number of background compiler threads. `0` picks a count based on
    /// the available parallelism.
    pub num_compiler_threads: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            enable_state_cache: true,
            num_compiler_threads: 0,
        }
    }
}

impl PipelineSettings {
    /// Parses settings from a JSON document. Missing fields keep their
    /// default values.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Applies overrides from [`ENV_STATE_CACHE`] and [`ENV_COMPILER_THREADS`].
    ///
    /// Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENV_STATE_CACHE) {
            self.enable_state_cache = value.trim() != "0";
        }

        if let Ok(value) = std::env::var(ENV_COMPILER_THREADS) {
            match value.trim().parse::<u32>() {
                Ok(count) => self.num_compiler_threads = count,
                Err(e) => log::warn!("Ignoring {ENV_COMPILER_THREADS}={value:?}: {e}"),
            }
        }
    }

    /// Resolves the effective number of compiler threads (always at least 1).
    #[must_use]
    pub fn compiler_thread_count(&self) -> usize {
        if self.num_compiler_threads > 0 {
            return self.num_compiler_threads as usize;
        }

        // Leave headroom for the render thread(s).
        let available = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        (available / 2).max(1)
    }
}
