//! Minification targets: a single asset file or a directory.

use std::path::{Path, PathBuf};

use super::AssetClass;
use crate::dispatch::MinifyError;

/// A validated path to run the external program against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File { path: PathBuf, class: AssetClass },
    Directory(PathBuf),
}

impl Target {
    /// Validate `path` as a file target.
    ///
    /// The extension is checked first so that an unsupported file is
    /// rejected without touching the filesystem any further.
    pub fn file(path: &Path) -> Result<Self, MinifyError> {
        let class = AssetClass::from_path(path)
            .ok_or_else(|| MinifyError::UnsupportedAssetType(path.to_path_buf()))?;
        if !path.is_file() {
            return Err(MinifyError::TargetNotFound(path.to_path_buf()));
        }
        Ok(Self::File {
            path: path.to_path_buf(),
            class,
        })
    }

    /// Validate `path` as a directory target.
    pub fn directory(path: &Path) -> Result<Self, MinifyError> {
        if !path.is_dir() {
            return Err(MinifyError::TargetNotFound(path.to_path_buf()));
        }
        Ok(Self::Directory(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::File { path, .. } | Self::Directory(path) => path,
        }
    }

    /// Asset class of a file target.
    pub fn class(&self) -> Option<AssetClass> {
        match self {
            Self::File { class, .. } => Some(*class),
            Self::Directory(_) => None,
        }
    }

    /// Base name for user-facing messages.
    pub fn display_name(&self) -> String {
        display_name(self.path())
    }
}

/// Base name of `path`, falling back to the whole path (e.g. for `/`).
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sibling written by the external program: `<stem>.min.<ext>`.
///
/// The program always writes the lowercase extension, so `App.JS` maps to
/// `App.min.js`.
pub fn minified_sibling(path: &Path) -> Option<PathBuf> {
    let class = AssetClass::from_path(path)?;
    let stem = path.file_stem()?.to_str()?;
    Some(path.with_file_name(format!("{stem}.min.{}", class.extension())))
}

/// Files already carrying `.min.` in their name are skipped by the program.
pub fn is_already_minified(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase().contains(".min."))
        .unwrap_or(false)
}
