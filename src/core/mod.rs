//! Process-wide state shared across the codebase.

mod state;

pub use state::{register_cancellation, setup_shutdown_handler};
