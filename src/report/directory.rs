//! Statistics recovered from a directory run's output.
//!
//! The processing program only prints human-oriented text and its wording
//! has changed over time, so every field is looked up through a small rule
//! table. Rules for a field are tried in priority order and the first one
//! that matches wins. A field nothing matches is 0; parsing never fails.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::asset::{AssetFilter, display_name};

/// Counts reported by one directory run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DirectorySummary {
    pub style_files_found: u64,
    pub script_files_found: u64,
    pub successfully_minified: u64,
    pub processed_in_nested_subdirectories: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Field {
    StyleFound,
    ScriptFound,
    Success,
    StyleTally,
    ScriptTally,
    Nested,
}

/// `(field, priority, pattern)`; the first capture group is the number.
const RULES: &[(Field, u8, &str)] = &[
    (Field::StyleFound, 0, r"Found ([0-9]+) CSS files"),
    (Field::ScriptFound, 0, r"Found ([0-9]+) JavaScript files"),
    // "Found 3 CSS files and 5 JavaScript files to process"
    (Field::ScriptFound, 1, r"and ([0-9]+) JavaScript files"),
    (Field::Success, 0, r"Minified ([0-9]+) files"),
    (Field::Success, 1, r"Actually minified ([0-9]+) files"),
    (Field::Success, 2, r"Counted ([0-9]+) successful minifications"),
    // "CSS: 2/3, JS: 1/5"; the denominator keeps "Minifying CSS: <path>" out
    (Field::StyleTally, 0, r"CSS: ([0-9]+)/[0-9]+"),
    (Field::ScriptTally, 0, r"JS: ([0-9]+)/[0-9]+"),
    (
        Field::Nested,
        0,
        r"Successfully processed ([0-9]+) files in nested subdirectories",
    ),
];

/// Compiled rules, ordered by field then priority.
static COMPILED: LazyLock<Vec<(Field, Regex)>> = LazyLock::new(|| {
    let mut rules = RULES.to_vec();
    rules.sort_by_key(|(field, priority, _)| (*field, *priority));
    rules
        .into_iter()
        .map(|(field, _, pattern)| (field, Regex::new(pattern).unwrap()))
        .collect()
});

/// First match for `field`, in priority order.
fn extract(text: &str, field: Field) -> Option<u64> {
    COMPILED
        .iter()
        .filter(|(f, _)| *f == field)
        .find_map(|(_, re)| re.captures(text)?.get(1)?.as_str().parse().ok())
}

impl DirectorySummary {
    /// Recover the summary from raw program output.
    pub fn parse(text: &str) -> Self {
        let successfully_minified = extract(text, Field::Success)
            .or_else(|| {
                let style = extract(text, Field::StyleTally);
                let script = extract(text, Field::ScriptTally);
                if style.is_none() && script.is_none() {
                    return None;
                }
                Some(style.unwrap_or(0).saturating_add(script.unwrap_or(0)))
            })
            .unwrap_or(0);

        Self {
            style_files_found: extract(text, Field::StyleFound).unwrap_or(0),
            script_files_found: extract(text, Field::ScriptFound).unwrap_or(0),
            successfully_minified,
            processed_in_nested_subdirectories: extract(text, Field::Nested).unwrap_or(0),
        }
    }

    /// Files found that count toward a run with `filter`.
    pub fn total_for(&self, filter: AssetFilter) -> u64 {
        match filter {
            AssetFilter::All => self.style_files_found.saturating_add(self.script_files_found),
            AssetFilter::StyleOnly => self.style_files_found,
            AssetFilter::ScriptOnly => self.script_files_found,
        }
    }

    pub fn touched_subdirectories(&self) -> bool {
        self.processed_in_nested_subdirectories > 0
    }
}

/// Outcome of a directory run, rendered as the summary sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryReport {
    pub dir: PathBuf,
    pub filter: AssetFilter,
    pub summary: DirectorySummary,
}

impl DirectoryReport {
    pub fn new(dir: &Path, filter: AssetFilter, output: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            filter,
            summary: DirectorySummary::parse(output),
        }
    }

    /// No qualifying files were found (or the output was unrecognizable).
    pub fn is_empty(&self) -> bool {
        self.summary.total_for(self.filter) == 0
    }
}

impl fmt::Display for DirectoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = display_name(&self.dir);
        let kind = match self.filter.retained() {
            Some(class) => format!("{} files", class.display_name()),
            None => "files".to_string(),
        };

        if self.is_empty() {
            let what = match self.filter.retained() {
                Some(class) => class.display_name(),
                None => "CSS or JS",
            };
            return write!(f, "No {what} files found in {name}.");
        }

        write!(
            f,
            "Minified {} of {} {kind} in {name}",
            self.summary.successfully_minified,
            self.summary.total_for(self.filter),
        )?;
        if self.summary.touched_subdirectories() {
            f.write_str(" (including files in subdirectories)")?;
        }
        f.write_str(".")
    }
}
