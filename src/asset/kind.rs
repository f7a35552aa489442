//! Asset class and filter definitions.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Class of minifiable asset, determines the sibling extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// Stylesheet (.css)
    Style,
    /// Script (.js)
    Script,
}

impl AssetClass {
    /// Detect asset class from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "css" => Some(Self::Style),
            "js" => Some(Self::Script),
            _ => None,
        }
    }

    /// Detect asset class from file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical extension, without the dot.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Style => "css",
            Self::Script => "js",
        }
    }

    /// Name used in user-facing sentences.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Style => "CSS",
            Self::Script => "JavaScript",
        }
    }

    /// The other class.
    pub const fn other(self) -> Self {
        match self {
            Self::Style => Self::Script,
            Self::Script => Self::Style,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Restriction applied to directory runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetFilter {
    #[default]
    All,
    StyleOnly,
    ScriptOnly,
}

impl AssetFilter {
    /// Class whose traversal must be disabled, if any.
    pub const fn excluded(self) -> Option<AssetClass> {
        match self {
            Self::All => None,
            Self::StyleOnly => Some(AssetClass::Script),
            Self::ScriptOnly => Some(AssetClass::Style),
        }
    }

    /// Class the run is restricted to, if any.
    pub const fn retained(self) -> Option<AssetClass> {
        match self {
            Self::All => None,
            Self::StyleOnly => Some(AssetClass::Style),
            Self::ScriptOnly => Some(AssetClass::Script),
        }
    }

    /// Short label for the progress indicator (`CSS/JS`, `CSS`, `JS`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "CSS/JS",
            Self::StyleOnly => "CSS",
            Self::ScriptOnly => "JS",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension_case_insensitive() {
        assert_eq!(AssetClass::from_extension("CSS"), Some(AssetClass::Style));
        assert_eq!(AssetClass::from_extension("Js"), Some(AssetClass::Script));
        assert_eq!(AssetClass::from_extension("ts"), None);
        assert_eq!(AssetClass::from_extension(""), None);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(
            AssetClass::from_path(Path::new("a/b/site.css")),
            Some(AssetClass::Style)
        );
        assert_eq!(
            AssetClass::from_path(Path::new("app.min.js")),
            Some(AssetClass::Script)
        );
        assert_eq!(AssetClass::from_path(Path::new("README")), None);
        assert_eq!(AssetClass::from_path(Path::new("index.html")), None);
    }

    #[test]
    fn test_filter_excluded_and_retained() {
        assert_eq!(AssetFilter::All.excluded(), None);
        assert_eq!(AssetFilter::StyleOnly.excluded(), Some(AssetClass::Script));
        assert_eq!(AssetFilter::ScriptOnly.excluded(), Some(AssetClass::Style));
        assert_eq!(AssetFilter::StyleOnly.retained(), Some(AssetClass::Style));
    }
}
