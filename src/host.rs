//! The invoking environment.
//!
//! A run needs a few things from whatever launched it: the document or
//! directory the user has selected, somewhere to show progress, and
//! somewhere to put the final message. Editors provide these through their
//! own UI; the terminal implementation reads the selection from environment
//! variables (set by editor integrations that shell out to this binary) and
//! renders through the logger.

use std::path::PathBuf;

use crate::logger::{self, StatusLine};

/// Environment variable naming the editor's active document.
pub const ACTIVE_FILE_ENV: &str = "MINIFY_ACTIVE_FILE";

/// Environment variable naming the directory selected in the editor.
pub const SELECTION_ENV: &str = "MINIFY_SELECTION";

pub trait Host {
    /// Guard for the in-progress indicator; dropping it retires the indicator.
    type Progress;

    /// Document to minify when `file` is run without a path.
    fn active_document(&self) -> Option<PathBuf>;

    /// Directory to minify when a directory command is run without a path.
    fn selection(&self) -> Option<PathBuf>;

    fn begin_progress(&self, label: &str) -> Self::Progress;

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, summary: &str, detail: &str);
}

/// Terminal host.
#[derive(Debug, Clone, Default)]
pub struct TerminalHost {
    active_document: Option<PathBuf>,
    selection: Option<PathBuf>,
}

impl TerminalHost {
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            active_document: read(ACTIVE_FILE_ENV),
            selection: read(SELECTION_ENV),
        }
    }
}

impl Host for TerminalHost {
    type Progress = StatusLine;

    fn active_document(&self) -> Option<PathBuf> {
        self.active_document.clone()
    }

    fn selection(&self) -> Option<PathBuf> {
        self.selection.clone()
    }

    fn begin_progress(&self, label: &str) -> StatusLine {
        StatusLine::new(label)
    }

    fn info(&self, message: &str) {
        logger::status_success(message);
    }

    fn warn(&self, message: &str) {
        logger::status_warning(message);
    }

    fn error(&self, summary: &str, detail: &str) {
        logger::status_error(summary, detail);
    }
}
