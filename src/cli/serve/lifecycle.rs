//! Session lifecycle.
//!
//! ```text
//! start:  BroadcastServer -> inject working copy -> web server
//!         -> ChangeCoordinator (+ FsActor) -> initial regeneration
//! stop:   coordinator -> watcher -> BroadcastServer -> web server -> working copy
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::{Receiver, TryRecvError};
use tiny_http::Server;
use tokio::sync::mpsc;

use crate::actor::ChangeCoordinator;
use crate::actor::fs::FsActor;
use crate::actor::messages::CoordinatorMsg;
use crate::config::PreviewConfig;
use crate::inject::ScriptInjector;
use crate::produce::{CommandProducer, DocumentProducer, FileProducer};
use crate::reload::BroadcastServer;
use crate::workspace::Workspace;
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// How often `wait` checks for a shutdown request
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Upper bound on waiting for the coordinator to wind down
const COORDINATOR_GRACE: Duration = Duration::from_secs(2);

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                let bound = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, bound));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind after {} attempts starting at port {}: {}",
        MAX_PORT_RETRIES,
        base_port,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

/// Pick the producer described by `[api]`.
pub fn build_producer(config: &PreviewConfig) -> Arc<dyn DocumentProducer> {
    if config.api.uses_command() {
        Arc::new(CommandProducer::new(
            &config.api.label,
            &config.api.command,
            &config.root,
        ))
    } else {
        Arc::new(FileProducer::new(&config.api.label, &config.api.entry))
    }
}

/// A running preview session
pub struct Session {
    workspace: Workspace,
    broadcast: BroadcastServer,
    http: Arc<Server>,
    http_addr: SocketAddr,
    http_thread: JoinHandle<()>,
    coordinator_tx: mpsc::Sender<CoordinatorMsg>,
    coordinator: tokio::task::JoinHandle<()>,
    watcher: Option<tokio::task::JoinHandle<()>>,
}

impl Session {
    /// Bring every component up in order. On failure, whatever already
    /// started is torn down again.
    pub async fn start(config: &PreviewConfig, workspace: Workspace) -> Result<Self> {
        let broadcast = BroadcastServer::start(config.reload.port_range()).await?;
        log!("reload"; "ws://{}:{}", config.reload.host, broadcast.port());

        let entry = workspace.join(&config.viewer.main_file);
        let injected = ScriptInjector::new(config.reload.host.as_str(), broadcast.port())
            .with_ready_event(config.viewer.ready_event.as_str())
            .inject(&entry);
        if let Err(e) = injected {
            broadcast.shutdown().await;
            return Err(e.into());
        }

        let (http, http_addr) = match bind_with_retry(config.serve.interface, config.serve.port) {
            Ok(bound) => bound,
            Err(e) => {
                broadcast.shutdown().await;
                return Err(e);
            }
        };
        let http = Arc::new(http);
        let http_thread = {
            let http = Arc::clone(&http);
            let root = workspace.root().to_path_buf();
            std::thread::spawn(move || super::run_request_loop(&http, &root))
        };
        log!("serve"; "{}", super::path::entry_url(http_addr, &config.viewer.main_file));

        let (coordinator_tx, coordinator_rx) = mpsc::channel(32);
        let coordinator = tokio::spawn(
            ChangeCoordinator::new(coordinator_rx, broadcast.clone(), build_producer(config)).run(),
        );

        let watcher = if config.watch.enable {
            spawn_watcher(config, &workspace, coordinator_tx.clone())
        } else {
            None
        };

        let session = Self {
            workspace,
            broadcast,
            http,
            http_addr,
            http_thread,
            coordinator_tx,
            coordinator,
            watcher,
        };

        // Late joiners get a document (or the error) from the start
        if session
            .coordinator_tx
            .send(CoordinatorMsg::Changed(Vec::new()))
            .await
            .is_err()
        {
            session.stop().await?;
            anyhow::bail!("change coordinator stopped during startup");
        }

        Ok(session)
    }

    pub fn http_server(&self) -> Arc<Server> {
        Arc::clone(&self.http)
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn broadcast(&self) -> &BroadcastServer {
        &self.broadcast
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.workspace.root().to_path_buf()
    }

    /// Block until shutdown is requested or the web server exits.
    pub async fn wait(&self, shutdown_rx: &Receiver<()>) {
        loop {
            match shutdown_rx.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }
            if self.http_thread.is_finished() {
                debug!("serve"; "web server exited");
                break;
            }
            tokio::time::sleep(SHUTDOWN_POLL).await;
        }
    }

    /// Stop every component in reverse order and remove the working copy.
    pub async fn stop(self) -> Result<()> {
        let Self {
            mut workspace,
            broadcast,
            http,
            http_thread,
            coordinator_tx,
            coordinator,
            watcher,
            ..
        } = self;

        let _ = coordinator_tx.send(CoordinatorMsg::Shutdown).await;
        drop(coordinator_tx);
        let abort = coordinator.abort_handle();
        if tokio::time::timeout(COORDINATOR_GRACE, coordinator)
            .await
            .is_err()
        {
            abort.abort();
        }

        if let Some(watcher) = watcher {
            watcher.abort();
            let _ = watcher.await;
        }

        broadcast.shutdown().await;

        http.unblock();
        let _ = tokio::task::spawn_blocking(move || http_thread.join()).await;

        workspace
            .cleanup()
            .context("Failed to remove the viewer working copy")?;
        debug!("serve"; "session stopped");
        Ok(())
    }
}

/// Watch the document source. Viewer files and the working copy never
/// trigger a regeneration.
fn spawn_watcher(
    config: &PreviewConfig,
    workspace: &Workspace,
    coordinator_tx: mpsc::Sender<CoordinatorMsg>,
) -> Option<tokio::task::JoinHandle<()>> {
    let root = if config.api.uses_command() {
        config.root.clone()
    } else {
        config
            .api
            .entry
            .parent()
            .map_or_else(|| config.root.clone(), |p| p.to_path_buf())
    };
    let mut ignored = vec![workspace.root().to_path_buf()];
    if !config.api.entry.starts_with(&config.viewer.source) {
        ignored.push(config.viewer.source.clone());
    }

    match FsActor::new(&[root], ignored, coordinator_tx) {
        Ok(actor) => Some(tokio::spawn(actor.run())),
        Err(e) => {
            log!("watch"; "file watching disabled: {}", e);
            None
        }
    }
}
