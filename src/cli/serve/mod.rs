//! `livedoc serve`: the full preview session.
//!
//! The viewer is copied to a temporary working copy, its entry page gets the
//! bridge bootstrap, and a static web server hosts the copy while the
//! broadcast server pushes each regenerated document to open viewers.

mod lifecycle;
mod path;
mod response;


pub use lifecycle::{Session, bind_with_retry, build_producer};

use std::path::Path;

use anyhow::{Context, Result};
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::config::PreviewConfig;
use crate::workspace::Workspace;
use crate::{debug, log};

/// Run a session until Ctrl+C.
pub fn serve(config: &PreviewConfig) -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(async {
        let workspace = Workspace::create(&config.viewer.source)?;
        debug!("serve"; "working copy at {}", workspace.root().display());

        let session = Session::start(config, workspace).await?;

        if config.serve.open {
            open_browser(&path::entry_url(session.http_addr(), &config.viewer.main_file));
        }

        let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
        crate::core::register_session(session.http_server(), shutdown_tx);

        session.wait(&shutdown_rx).await;
        session.stop().await
    })
}

/// Launch the system browser. Failure only logs.
fn open_browser(url: &str) {
    match open::that_detached(url) {
        Ok(()) => debug!("serve"; "opened {url} in browser"),
        Err(e) => log!("serve"; "cannot open browser: {e}"),
    }
}

/// Serve requests until the server is unblocked.
fn run_request_loop(server: &Server, root: &Path) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, root) {
            log!("serve"; "request error: {e}");
        }
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, root: &Path) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_unavailable(request);
    }

    match path::resolve_path(request.url(), root) {
        Some(path) => response::respond_file(request, &path),
        None => {
            debug!("serve"; "404 {}", request.url());
            response::respond_not_found(request)
        }
    }
}
