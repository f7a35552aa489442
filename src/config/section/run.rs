//! `[run]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [run]
//! timeout = 300             # seconds before the program is killed (0 = never)
//! max_output = 10485760     # bytes captured per stream
//! scratch_dir = ".cache"    # where filtered program variants are written
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::exec::DEFAULT_MAX_OUTPUT;

/// Subprocess limits and scratch location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Timeout in seconds, `0` disables it.
    pub timeout: u64,

    /// Maximum bytes captured from each output stream.
    pub max_output: usize,

    /// Directory for scratch scripts (default: system temp dir).
    pub scratch_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout: 300,
            max_output: DEFAULT_MAX_OUTPUT,
            scratch_dir: None,
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }

    /// Resolved scratch directory.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.max_output == 0 {
            errors.push("[run] max_output must be greater than 0".into());
        }
    }
}
