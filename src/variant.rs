//! Filtered variants of the external processing program.
//!
//! A css-only run needs a program that never enumerates `.js` files (and
//! the other way around). The variant is the original source with the
//! excluded class's traversal statement swapped for an empty assignment.
//! Nothing else changes, byte for byte.
//!
//! The substitution is textual: if the statement is not present verbatim
//! the variant equals the original and the run processes both classes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use crate::asset::AssetClass;
use crate::config::VariantConfig;
use crate::debug;
use crate::dispatch::MinifyError;

/// Produce the program text with `excluded`'s traversal neutralized.
pub fn generate_variant(original: &str, excluded: AssetClass, config: &VariantConfig) -> String {
    let (traversal, replacement) = config.substitution(excluded);
    if traversal.is_empty() {
        return original.to_string();
    }
    original.replace(traversal, replacement)
}

/// Number of traversal statements a variant for `excluded` would replace.
pub fn count_traversals(original: &str, excluded: AssetClass, config: &VariantConfig) -> usize {
    let (traversal, _) = config.substitution(excluded);
    if traversal.is_empty() {
        return 0;
    }
    original.matches(traversal).count()
}

/// A program variant written to a uniquely named scratch file.
///
/// The file is removed when the value is dropped, so it never outlives the
/// run that created it, whichever way that run ends.
#[derive(Debug)]
pub struct ScratchScript {
    path: TempPath,
}

impl ScratchScript {
    /// Read `program`, generate the variant and write it under `scratch_dir`.
    ///
    /// Names look like `minify-skip-js-Xy12Ab.py`: namespaced by the
    /// excluded class, with a random suffix per invocation.
    pub fn create(
        program: &Path,
        excluded: AssetClass,
        config: &VariantConfig,
        scratch_dir: &Path,
    ) -> Result<Self, MinifyError> {
        let original = fs::read_to_string(program).map_err(|e| MinifyError::io(program, e))?;

        let replaced = count_traversals(&original, excluded, config);
        if replaced == 0 {
            debug!("variant"; "no {} traversal found in {}, running unfiltered", excluded, program.display());
        } else {
            debug!("variant"; "disabled {} {} traversal(s)", replaced, excluded);
        }
        let variant = generate_variant(&original, excluded, config);

        fs::create_dir_all(scratch_dir).map_err(|e| MinifyError::io(scratch_dir, e))?;

        let suffix = program
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let prefix = format!("minify-skip-{excluded}-");

        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile_in(scratch_dir)
            .map_err(|e| MinifyError::io(scratch_dir, e))?;

        file.write_all(variant.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|e| MinifyError::io(file.path(), e))?;

        // Close the handle so the interpreter can open the file everywhere
        let path = file.into_temp_path();
        debug!("variant"; "wrote {}", path.display());

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting failures instead of ignoring them.
    pub fn remove(self) -> Result<(), MinifyError> {
        let path: PathBuf = self.path.to_path_buf();
        self.path.close().map_err(|e| MinifyError::io(&path, e))
    }
}
