//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `expand_path` - `~` expansion, then resolution against a base directory

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand a leading `~` and resolve relative results against `base`.
///
/// # Example
/// ```ignore
/// expand_path(Path::new("~/Desktop/minify_assets.py"), root) // /home/me/Desktop/...
/// expand_path(Path::new("tools/minify.py"), root)            // <root>/tools/minify.py
/// ```
pub fn expand_path(path: &Path, base: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    let path = PathBuf::from(expanded);
    if path.is_relative() {
        base.join(path)
    } else {
        path
    }
}
