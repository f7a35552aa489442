//! Error taxonomy for minification runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::utils::exec::ExecError;

/// Failures surfaced to the user. Parsing problems never show up here;
/// they degrade to zero counts instead.
#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("No file or directory selected.")]
    NoTargetSelected,

    #[error("`{}` does not exist or is not the expected kind of path", .0.display())]
    TargetNotFound(PathBuf),

    #[error("`{}` is not a CSS or JS file", .0.display())]
    UnsupportedAssetType(PathBuf),

    #[error("could not find {what} `{name}`")]
    ExternalProgramMissing {
        what: &'static str,
        name: String,
        searched: Vec<PathBuf>,
    },

    /// Spawn error or non-zero exit; `stderr` is whatever the program wrote.
    #[error("{}", join_stderr(.message, .stderr))]
    SubprocessFailure { message: String, stderr: String },

    #[error("processing program timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("run cancelled")]
    Cancelled,

    #[error("processing program wrote more than {0} bytes of output")]
    OutputLimitExceeded(usize),

    #[error("IO error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MinifyError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Extra lines to show under the message (locations searched).
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::ExternalProgramMissing { searched, .. } if !searched.is_empty() => Some(
                searched
                    .iter()
                    .map(|p| format!("  tried: {}", p.display()))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

fn join_stderr(message: &str, stderr: &str) -> String {
    if stderr.is_empty() {
        message.to_string()
    } else {
        format!("{message}\n{stderr}")
    }
}

impl From<ExecError> for MinifyError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::Timeout { timeout, .. } => Self::Timeout(timeout),
            ExecError::Cancelled { .. } => Self::Cancelled,
            ExecError::OutputLimit { limit, .. } => Self::OutputLimitExceeded(limit),
            other => Self::SubprocessFailure {
                message: other.to_string(),
                stderr: other.stderr().to_string(),
            },
        }
    }
}
