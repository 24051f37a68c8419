//! Process state for a preview session.
//!
//! Two orthogonal states:
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SERVER` / `SHUTDOWN_TX`: handles the Ctrl+C handler uses to unblock
//!   the web server and wake the session

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the session
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on whether a session has been registered:
/// - Before `register_session()`: exits immediately, nothing to clean up
/// - After `register_session()`: unblock the web server, wake the session so
///   it can stop the broadcast server and remove the working copy
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let Some(tx) = SHUTDOWN_TX.get() else {
            std::process::exit(0);
        };

        crate::log!("serve"; "shutting down...");
        let _ = tx.send(());
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the session's shutdown channel and web server
///
/// Call this after binding the server, before entering the request loop
pub fn register_session(server: Arc<Server>, shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering, worst case is one more loop iteration
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
