//! Logging utilities with colored output and a transient status line.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output gated on `--verbose`
//! - `StatusLine` for the in-progress indicator shown while a run is active
//! - `status_*` helpers for the terminal message of a run
//!
//! # Example
//!
//! ```ignore
//! log!("dir"; "scanning {}", dir.display());
//!
//! let status = StatusLine::new("minifying app.css...");
//! // ... run the program ...
//! drop(status); // line is cleared
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write, stderr, stdout},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Human-readable output goes to stderr while stdout carries `--json`.
static JSON_OUTPUT: AtomicBool = AtomicBool::new(false);

/// Reserve stdout for machine-readable output.
pub fn set_json_output(v: bool) {
    JSON_OUTPUT.store(v, Ordering::SeqCst);
}

/// Stream that log lines and status lines are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

fn human_stream() -> Stream {
    if JSON_OUTPUT.load(Ordering::SeqCst) {
        Stream::Stderr
    } else {
        Stream::Stdout
    }
}

/// Rendered status lines currently alive, oldest first. The lock also
/// serializes writes so concurrent runs don't interleave half lines.
static ACTIVE: Mutex<Vec<(u64, String)>> = Mutex::new(Vec::new());

static NEXT_STATUS_ID: AtomicU64 = AtomicU64::new(0);

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
///
/// A visible status line is erased first and drawn again below the
/// message.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    emit(Some(&format!("{prefix} {message}")));
}

/// Write `message` (if any) and repaint the newest status line.
fn emit(message: Option<&str>) {
    let active = ACTIVE.lock();
    match human_stream() {
        Stream::Stdout => {
            let mut out = stdout().lock();
            let tty = out.is_terminal();
            paint(&mut out, tty, &active, message);
        }
        Stream::Stderr => {
            let mut out = stderr().lock();
            let tty = out.is_terminal();
            paint(&mut out, tty, &active, message);
        }
    }
}

/// Status lines are only drawn on a terminal; pipes get plain lines.
fn paint<W: Write>(out: &mut W, tty: bool, active: &[(u64, String)], message: Option<&str>) {
    if tty {
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    if let Some(message) = message {
        writeln!(out, "{message}").ok();
    }
    if tty && let Some((_, line)) = active.last() {
        write!(out, "{line}").ok();
    }
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "file" | "dir" => prefix.bright_blue().bold().to_string(),
        "done" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Terminal messages
// ============================================================================

/// Success message (✓ prefix, green).
pub fn status_success(message: &str) {
    log("done", &format!("{} {message}", "✓".green()));
}

/// Warning message (⚠ prefix, yellow).
pub fn status_warning(message: &str) {
    log("warning", &format!("{} {message}", "⚠".yellow()));
}

/// Error message (✗ prefix, red) with optional detail on following lines.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{}", detail.dimmed())
    };
    log("error", &format!("{} {message}", "✗".red()));
}

// ============================================================================
// Status Line (in-progress indicator)
// ============================================================================

/// Single-line in-progress indicator.
///
/// Displays: `[minify] ⟳ minifying app.css...`
///
/// The line stays on screen (without a trailing newline) until the value is
/// dropped. Log messages printed meanwhile scroll above it. When several
/// are alive the newest one is shown, and dropping it brings back the
/// previous one. Every exit path (including `?` and panics) retires it.
pub struct StatusLine {
    id: u64,
}

impl StatusLine {
    /// Show a new status line.
    pub fn new(label: impl Into<String>) -> Self {
        let id = NEXT_STATUS_ID.fetch_add(1, Ordering::SeqCst);
        let prefix = colorize_prefix("minify", "minify");
        let line = format!("{} {} {}", prefix, "⟳".cyan(), label.into());
        ACTIVE.lock().push((id, line));
        emit(None);
        Self { id }
    }
}

impl Drop for StatusLine {
    fn drop(&mut self) {
        ACTIVE.lock().retain(|(id, _)| *id != self.id);
        emit(None);
    }
}

// ============================================================================
// Tests
// ============================================================================
