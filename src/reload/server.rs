//! Broadcast Server for Live Preview
//!
//! Public handle over the WebSocket actor. The acceptor thread gives each
//! connection a short-lived handshake thread, which hands the finished
//! connection to `WsActor` via channel, so every mutation of the client set
//! and the last message is serialized through one actor.
//!
//! # Lifecycle
//!
//! ```text
//! start(range) -> allocate port -> spawn WsActor + acceptor thread
//! send_*()     -> WsMsg::Send -> broadcast + remember
//! shutdown()   -> WsMsg::Shutdown (close clients) -> stop acceptor -> port released
//! ```

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use super::message::{ErrorLevel, Message};
use super::port;
use crate::actor::messages::{ServerSnapshot, WsMsg};
use crate::actor::ws::WsActor;
use crate::core::PreviewError;

/// Accept loop poll interval while no connection is pending
const ACCEPT_POLL: Duration = Duration::from_millis(50);

/// Upper bound for a client to finish the WebSocket handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Channel capacity between the handle and the actor
const CHANNEL_CAPACITY: usize = 64;

/// Handle to a running broadcast server. Cheap to clone.
#[derive(Clone)]
pub struct BroadcastServer {
    inner: Arc<Inner>,
}

struct Inner {
    port: u16,
    tx: mpsc::Sender<WsMsg>,
    /// `None` once shut down
    acceptor: Mutex<Option<Acceptor>>,
}

struct Acceptor {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl BroadcastServer {
    /// Bind the first free loopback port in `range` and start serving.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(range: RangeInclusive<u16>) -> Result<Self, PreviewError> {
        let (listener, port) = port::allocate(range)?;
        listener
            .set_nonblocking(true)
            .map_err(|e| PreviewError::Io(format!("127.0.0.1:{port}").into(), e))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let running = Arc::new(AtomicBool::new(true));
        tokio::spawn(WsActor::new(rx, Arc::clone(&running)).run());

        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            let tx = tx.clone();
            std::thread::spawn(move || accept_loop(listener, tx, stop))
        };

        crate::debug!("reload"; "broadcast server on ws://127.0.0.1:{}", port);

        Ok(Self {
            inner: Arc::new(Inner {
                port,
                tx,
                acceptor: Mutex::new(Some(Acceptor { stop, thread })),
            }),
        })
    }

    /// Bound port, fixed for the server's lifetime
    pub fn port(&self) -> u16 {
        self.inner.port
    }

    /// Broadcast the full document and remember it
    pub async fn send_document(&self, doc: Value) -> Result<(), PreviewError> {
        self.send(Message::document(doc)).await
    }

    /// Broadcast "regeneration in progress" and remember it
    pub async fn send_loading(&self) -> Result<(), PreviewError> {
        self.send(Message::loading()).await
    }

    /// Broadcast an error notice and remember it
    pub async fn send_error(
        &self,
        level: ErrorLevel,
        text: impl Into<String>,
    ) -> Result<(), PreviewError> {
        self.send(Message::error(level, text)).await
    }

    /// Broadcast any message and remember it
    pub async fn send(&self, message: Message) -> Result<(), PreviewError> {
        self.inner
            .tx
            .send(WsMsg::Send(message))
            .await
            .map_err(|_| PreviewError::ServerStopped)
    }

    /// Most recently sent message, if any
    pub async fn last_message(&self) -> Result<Option<Message>, PreviewError> {
        Ok(self.snapshot().await?.last)
    }

    /// Number of clients currently registered
    pub async fn client_count(&self) -> Result<usize, PreviewError> {
        Ok(self.snapshot().await?.clients)
    }

    async fn snapshot(&self) -> Result<ServerSnapshot, PreviewError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner
            .tx
            .send(WsMsg::Snapshot(reply_tx))
            .await
            .map_err(|_| PreviewError::ServerStopped)?;
        reply_rx.await.map_err(|_| PreviewError::ServerStopped)
    }

    /// Close every client and the listening socket.
    ///
    /// Returns once the listener is dropped and the port is free again.
    /// Further calls are no-ops.
    pub async fn shutdown(&self) {
        let Some(acceptor) = self.inner.acceptor.lock().take() else {
            return;
        };

        let (ack_tx, ack_rx) = oneshot::channel();
        if self.inner.tx.send(WsMsg::Shutdown(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }

        acceptor.stop.store(true, Ordering::SeqCst);
        let _ = tokio::task::spawn_blocking(move || acceptor.thread.join()).await;
        crate::debug!("reload"; "port {} released", self.inner.port);
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.inner.acceptor.lock().is_none()
    }
}

/// Accept connections until `stop` is set. Owns (and finally drops) the listener.
fn accept_loop(listener: TcpListener, tx: mpsc::Sender<WsMsg>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                crate::debug!("reload"; "connection from {}", addr);
                if tx.is_closed() {
                    crate::debug!("reload"; "actor gone, acceptor exiting");
                    break;
                }

                // A client that never finishes its handshake must not hold up the next one
                let tx = tx.clone();
                std::thread::spawn(move || handshake(stream, addr, &tx));
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                std::thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                crate::log!("reload"; "accept error: {}", e);
                std::thread::sleep(ACCEPT_POLL);
            }
        }
    }
}

/// Complete the WebSocket handshake within [`HANDSHAKE_TIMEOUT`] and hand
/// the client to the actor.
fn handshake(stream: TcpStream, addr: SocketAddr, tx: &mpsc::Sender<WsMsg>) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT));

    match tungstenite::accept(stream) {
        Ok(ws) => {
            let _ = ws.get_ref().set_read_timeout(None);
            if tx.blocking_send(WsMsg::AddClient(ws)).is_err() {
                crate::debug!("reload"; "actor gone, dropping {}", addr);
            }
        }
        Err(e) => {
            crate::debug!("reload"; "handshake failed for {}: {}", addr, e);
        }
    }
}
