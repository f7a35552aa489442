//! `[variant]` section configuration.
//!
//! Controls how restricted (css-only / js-only) directory runs are realized.
//!
//! By default the program source is patched: the traversal line that
//! enumerates the excluded class is replaced with an empty assignment.
//! When `filter_args` is set, the canonical program is run unmodified with
//! those extra arguments instead (`{class}` expands to `css` or `js`).
//!
//! # Example
//!
//! ```toml
//! [variant]
//! filter_args = ["--only", "{class}"]
//! ```

use serde::{Deserialize, Serialize};

use crate::asset::AssetClass;

/// Restricted-run settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantConfig {
    /// Statement enumerating stylesheets in the program source.
    pub style_traversal: String,
    /// Replacement used when stylesheets are excluded.
    pub style_replacement: String,
    /// Statement enumerating scripts in the program source.
    pub script_traversal: String,
    /// Replacement used when scripts are excluded.
    pub script_replacement: String,
    /// Arguments passed instead of patching, empty = patch.
    pub filter_args: Vec<String>,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            style_traversal:
                "css_files = glob.glob(os.path.join(directory, '**', '*.css'), recursive=True)"
                    .into(),
            style_replacement: "css_files = []  # Skip CSS files".into(),
            script_traversal:
                "js_files = glob.glob(os.path.join(directory, '**', '*.js'), recursive=True)"
                    .into(),
            script_replacement: "js_files = []  # Skip JS files".into(),
            filter_args: Vec::new(),
        }
    }
}

impl VariantConfig {
    /// `(traversal, replacement)` for the class being excluded.
    pub fn substitution(&self, excluded: AssetClass) -> (&str, &str) {
        match excluded {
            AssetClass::Style => (&self.style_traversal, &self.style_replacement),
            AssetClass::Script => (&self.script_traversal, &self.script_replacement),
        }
    }

    /// Whether restricted runs pass arguments instead of patching.
    pub fn uses_filter_args(&self) -> bool {
        !self.filter_args.is_empty()
    }

    /// Expanded `filter_args` for a run restricted to `retained`.
    pub fn filter_args_for(&self, retained: AssetClass) -> Vec<String> {
        self.filter_args
            .iter()
            .map(|arg| arg.replace("{class}", retained.extension()))
            .collect()
    }

    pub fn validate(&self, errors: &mut Vec<String>) {
        if self.uses_filter_args() {
            return;
        }
        if self.style_traversal.is_empty() || self.script_traversal.is_empty() {
            errors.push("[variant] traversal statements must not be empty".into());
        }
    }
}
