//! Asset classes, run filters and validated targets.
//!
//! - `kind`: `AssetClass` (css/js) and `AssetFilter` (all, css-only, js-only)
//! - `target`: `Target` validation and `.min` sibling naming

mod kind;
mod target;

pub use kind::{AssetClass, AssetFilter};
pub use target::{Target, display_name, is_already_minified, minified_sibling};
