//! WebSocket Actor - Broadcast with Last-Message Replay
//!
//! This actor is responsible for:
//! - Owning the set of connected viewer clients
//! - Broadcasting messages to all open clients
//! - Remembering the most recent message and replaying it to late joiners
//! - Closing every client on shutdown
//!
//! # Architecture
//!
//! ```text
//! ChangeCoordinator --[Send]--> WsActor --[broadcast]--> Clients
//! acceptor thread --[AddClient]--^   ^
//!                 reader thread -----+ (drops closed clients)
//! ```
//!
//! All mutations of the client set and the last message happen in response
//! to messages processed serially by `run`. The reader thread only removes
//! clients whose socket reported close or error.

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::{Utf8Bytes, WebSocket};

use super::messages::{ServerSnapshot, WsMsg};
use crate::reload::message::Message;

/// A registered WebSocket client
struct RegisteredClient {
    /// Connection counter value, for logging only
    id: u64,
    ws: WebSocket<TcpStream>,
}

/// Last message sent, kept with its serialized frame for cheap replay
struct LastMessage {
    message: Message,
    frame: Utf8Bytes,
}

/// WebSocket Actor - manages client connections and broadcasts
pub struct WsActor {
    /// Channel to receive messages
    rx: mpsc::Receiver<WsMsg>,
    /// Connected clients (shared with the reader thread)
    clients: Arc<Mutex<Vec<RegisteredClient>>>,
    /// Overwritten on every send, replayed on connect
    last: Option<LastMessage>,
    /// Cleared on shutdown; stops the reader thread
    running: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl WsActor {
    /// Create a new WsActor
    pub fn new(rx: mpsc::Receiver<WsMsg>, running: Arc<AtomicBool>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            last: None,
            running,
            next_id: AtomicU64::new(1),
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let running = Arc::clone(&self.running);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, running);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                WsMsg::Send(message) => {
                    crate::debug!("ws"; "sending {}", message.kind());
                    let frame = Utf8Bytes::from(message.to_json());
                    self.broadcast(&frame);
                    self.last = Some(LastMessage { message, frame });
                }

                WsMsg::AddClient(ws) => {
                    self.add_client(ws);
                }

                WsMsg::Snapshot(reply) => {
                    let _ = reply.send(self.snapshot());
                }

                WsMsg::Shutdown(ack) => {
                    crate::debug!("ws"; "shutting down");
                    self.rx.close();
                    self.close_all();
                    self.running.store(false, Ordering::SeqCst);
                    let _ = ack.send(());
                    break;
                }
            }
        }

        // Handle dropped without an explicit shutdown
        self.close_all();
        self.running.store(false, Ordering::SeqCst);
    }

    fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            last: self.last.as_ref().map(|l| l.message.clone()),
            clients: self.clients.lock().len(),
        }
    }

    fn close_all(&self) {
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.ws.close(None);
            let _ = client.ws.flush();
        }
    }
}
