//! Configuration section definitions.
//!
//! Each module corresponds to a section in `minify.toml`:
//!
//! | Module    | TOML Section | Purpose                                   |
//! |-----------|--------------|-------------------------------------------|
//! | `program` | `[program]`  | Interpreter and processing program        |
//! | `run`     | `[run]`      | Timeout, output cap, scratch directory    |
//! | `variant` | `[variant]`  | How css-only / js-only runs are realized  |

mod program;
mod run;
mod variant;

pub use program::ProgramConfig;
pub use run::RunConfig;
pub use variant::VariantConfig;
