//! Shutdown state.
//!
//! `CANCEL` is the token handed to in-flight runs so Ctrl+C kills their
//! children instead of orphaning them.

use std::sync::OnceLock;

use tokio_util::sync::CancellationToken;

/// Cancellation token for the running dispatch
static CANCEL: OnceLock<CancellationToken> = OnceLock::new();

/// Exit status after an interrupt with nothing to wind down.
const INTERRUPTED: i32 = 130;

// =============================================================================
// SHUTDOWN state
// =============================================================================

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a token has been registered:
/// - Before `register_cancellation()`: exit immediately
/// - After `register_cancellation()`: cancel the token; the running
///   subprocess is killed, scratch files are removed and the run reports
///   `Cancelled`
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if let Some(token) = CANCEL.get() {
            crate::log!("minify"; "cancelling...");
            token.cancel();
        } else {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the token that Ctrl+C should cancel
///
/// Returns a clone for the dispatcher. Only the first registration sticks.
pub fn register_cancellation(token: CancellationToken) -> CancellationToken {
    CANCEL.get_or_init(|| token).clone()
}

// =============================================================================
// Tests
// =============================================================================
