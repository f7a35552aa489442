//! Result aggregation.
//!
//! - `directory`: `DirectorySummary` parsed from program output, and the
//!   summary sentence for a directory run
//! - `file`: `SingleFileOutcome` computed from file sizes

mod directory;
mod file;

pub use directory::DirectoryReport;
pub use file::{FileReport, SingleFileOutcome};
