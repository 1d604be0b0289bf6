//! Shutdown state for the watch session.
//!
//! Ctrl+C sets the `SHUTDOWN` flag and, once a session is registered,
//! forwards a [`SessionEvent::Shutdown`] into its event queue so the loop
//! closes the channel and returns.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc::UnboundedSender;

use crate::actor::messages::SessionEvent;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Event queue of the running session
static SESSION_TX: OnceLock<UnboundedSender<SessionEvent>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// - Before `register_session()`: exit immediately, nothing to close
/// - After `register_session()`: ask the session loop to stop
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if !request_shutdown(SESSION_TX.get()) {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the running session's event queue for graceful shutdown
pub fn register_session(tx: UnboundedSender<SessionEvent>) {
    let _ = SESSION_TX.set(tx);
}

/// Mark shutdown and notify the session. Returns false when no session
/// could be notified.
fn request_shutdown(session: Option<&UnboundedSender<SessionEvent>>) -> bool {
    SHUTDOWN.store(true, Ordering::SeqCst);
    match session {
        Some(tx) => {
            crate::log!("ws"; "shutting down...");
            tx.send(SessionEvent::Shutdown).is_ok()
        }
        None => false,
    }
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
