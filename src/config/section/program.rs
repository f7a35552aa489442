//! `[program]` section configuration.
//!
//! Locates the external processing program.
//!
//! # Example
//!
//! ```toml
//! [program]
//! interpreter = "python3"                     # resolved on PATH
//! script = "tools/minify_assets.py"           # relative to the config root
//! search = ["~/Desktop/minify_assets.py"]     # copied to `script` when it is missing
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External program settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Interpreter the script is run with.
    pub interpreter: String,

    /// Path to the processing program.
    pub script: PathBuf,

    /// Fallback locations tried in order when `script` does not exist.
    pub search: Vec<PathBuf>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            interpreter: "python".into(),
            script: "minify_assets.py".into(),
            search: vec!["~/Desktop/minify_assets.py".into()],
        }
    }
}

impl ProgramConfig {
    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.interpreter.trim().is_empty() {
            errors.push("[program] interpreter must not be empty".into());
        }
        if self.script.as_os_str().is_empty() {
            errors.push("[program] script must not be empty".into());
        }
    }
}
