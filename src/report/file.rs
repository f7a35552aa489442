//! Single-file outcomes, derived from file sizes rather than program output.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::asset::display_name;

/// Size change between an asset and its `.min` sibling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SingleFileOutcome {
    pub original_size_bytes: u64,
    pub minified_size_bytes: u64,
    /// Negative when the "minified" file came out larger.
    pub saved_bytes: i64,
    /// Rounded to one decimal; `0.0` for an empty original.
    pub saved_percent: f64,
}

impl SingleFileOutcome {
    #[allow(clippy::cast_possible_wrap, clippy::cast_precision_loss)]
    pub fn compute(original_size_bytes: u64, minified_size_bytes: u64) -> Self {
        let saved_bytes = original_size_bytes as i64 - minified_size_bytes as i64;
        let saved_percent = if original_size_bytes == 0 {
            0.0
        } else {
            let percent = saved_bytes as f64 / original_size_bytes as f64 * 100.0;
            (percent * 10.0).round() / 10.0
        };

        Self {
            original_size_bytes,
            minified_size_bytes,
            saved_bytes,
            saved_percent,
        }
    }
}

/// What a single-file run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum FileReport {
    Minified {
        path: PathBuf,
        output: PathBuf,
        outcome: SingleFileOutcome,
    },
    /// The program exited cleanly but the `.min` sibling is missing.
    NoOutput { path: PathBuf },
    /// The input is itself a `.min` file; nothing was run.
    AlreadyMinified { path: PathBuf },
}

impl FileReport {
    pub fn path(&self) -> &Path {
        match self {
            Self::Minified { path, .. } | Self::NoOutput { path } | Self::AlreadyMinified { path } => {
                path
            }
        }
    }

    /// Whether the message should be shown as a warning.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Self::Minified { .. })
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = display_name(self.path());
        match self {
            Self::Minified { outcome, .. } => write!(
                f,
                "Successfully minified {name}. Saved {:.1}% ({} bytes).",
                outcome.saved_percent, outcome.saved_bytes
            ),
            Self::NoOutput { .. } => {
                write!(f, "Failed to minify {name}. Minified file not found.")
            }
            Self::AlreadyMinified { .. } => {
                write!(f, "{name} is already minified, skipping.")
            }
        }
    }
}
