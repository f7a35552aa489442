//! Configuration management for `minify.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [program], [run], [variant]
//! ├── error          # ConfigError
//! ├── util           # config file discovery
//! └── mod.rs         # MinifyConfig (this file)
//! ```
//!
//! The config file is optional. It is searched upward from the current
//! directory; when none is found every section takes its defaults and the
//! current directory acts as the root.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{ProgramConfig, RunConfig, VariantConfig};

use util::find_config_file;

use crate::{cli::Cli, debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing minify.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinifyConfig {
    /// Path to the loaded config file, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Directory relative paths are resolved against (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// External program location
    #[serde(default)]
    pub program: ProgramConfig,

    /// Subprocess limits
    #[serde(default)]
    pub run: RunConfig,

    /// Restricted-run settings
    #[serde(default)]
    pub variant: VariantConfig,
}

impl MinifyConfig {
    /// Load configuration and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| cwd.clone());
                config.config_path = Some(path);
                config
            }
            None => {
                debug!("config"; "no {} found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.root = crate::utils::path::normalize_path(&config.root);
        if let Some(path) = &config.config_path {
            debug!("config"; "using {} (root {})", path.display(), config.root.display());
        }
        config.apply_cli_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring: {}", display_path, fields.join(", "));
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Resolve a configured path (with `~` expansion) against the root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        crate::utils::path::expand_path(path.as_ref(), &self.root)
    }

    /// Scratch directory for program variants, resolved against the root.
    pub fn scratch_dir(&self) -> PathBuf {
        match &self.run.scratch_dir {
            Some(dir) if !dir.as_os_str().is_empty() => self.root_join(dir),
            _ => self.run.scratch_dir(),
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply global CLI flags over file values.
    fn apply_cli_options(&mut self, cli: &Cli) {
        Self::update_option(&mut self.run.timeout, cli.timeout.as_ref());
        Self::update_option(&mut self.program.interpreter, cli.interpreter.as_ref());
        Self::update_option(&mut self.program.script, cli.script.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate all sections, collecting every error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        self.program.validate(&mut errors);
        self.run.validate(&mut errors);
        self.variant.validate(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> MinifyConfig {
    let (parsed, ignored) = MinifyConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
