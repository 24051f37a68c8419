//! Actor Message Definitions
//!
//! Message types for inter-actor communication.
//!
//! ```text
//! FsActor --Changed--> ChangeCoordinator --Send--> WsActor --> Clients
//!                                                    ^
//!                     acceptor thread --AddClient----+
//! ```

use std::net::TcpStream;
use std::path::PathBuf;

use tokio::sync::oneshot;
use tungstenite::WebSocket;

use crate::reload::message::Message;

// =============================================================================
// ChangeCoordinator Messages
// =============================================================================

/// Messages to the ChangeCoordinator
#[derive(Debug)]
pub enum CoordinatorMsg {
    /// Watched files changed (empty for the initial regeneration)
    Changed(Vec<PathBuf>),
    /// Shutdown
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Observable broadcast state, for status queries and tests
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSnapshot {
    /// Most recently sent message
    pub last: Option<Message>,
    /// Number of registered clients
    pub clients: usize,
}

/// Messages to WebSocket Actor
pub enum WsMsg {
    /// Broadcast to every open client and remember as last message
    Send(Message),
    /// Register a client whose handshake already completed
    AddClient(WebSocket<TcpStream>),
    /// Report current state
    Snapshot(oneshot::Sender<ServerSnapshot>),
    /// Close every client and stop; acked once all sockets are closed
    Shutdown(oneshot::Sender<()>),
}
