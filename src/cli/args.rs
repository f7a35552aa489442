//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::asset::AssetFilter;
use crate::dispatch::Action;

/// Minify CSS and JavaScript assets with an external processing program
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "minify.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Kill the processing program after this many seconds (0 = never)
    #[arg(short, long, global = true)]
    pub timeout: Option<u64>,

    /// Interpreter used to run the processing program
    #[arg(long, global = true)]
    pub interpreter: Option<String>,

    /// Processing program path (overrides `[program] script`)
    #[arg(long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub script: Option<PathBuf>,

    /// Also print the report as a single JSON line
    #[arg(long, global = true)]
    pub json: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Minify a single .css or .js file (default: the editor's active file)
    #[command(visible_alias = "f")]
    File {
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: Option<PathBuf>,
    },

    /// Minify every CSS and JS file in a directory, recursively
    #[command(visible_alias = "d")]
    Dir {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,
    },

    /// Minify only the CSS files in a directory
    Css {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,
    },

    /// Minify only the JavaScript files in a directory
    Js {
        #[arg(value_hint = clap::ValueHint::DirPath)]
        path: Option<PathBuf>,
    },
}

impl Commands {
    /// Explicit path argument, if given.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::File { path } | Self::Dir { path } | Self::Css { path } | Self::Js { path } => {
                path.as_ref()
            }
        }
    }

    /// Filter for directory commands, `None` for `file`.
    pub const fn filter(&self) -> Option<AssetFilter> {
        match self {
            Self::File { .. } => None,
            Self::Dir { .. } => Some(AssetFilter::All),
            Self::Css { .. } => Some(AssetFilter::StyleOnly),
            Self::Js { .. } => Some(AssetFilter::ScriptOnly),
        }
    }

    pub const fn action(&self) -> Action {
        match self.filter() {
            None => Action::MinifyFile,
            Some(filter) => Action::MinifyDirectory(filter),
        }
    }
}
