//! Reload Module
//!
//! Pushes generated documents to connected viewers over WebSocket.
//!
//! # Architecture
//!
//! ```text
//! FsActor -> ChangeCoordinator -> WsActor -> Viewer (ClientBridge)
//!  (watch)     (produce)        (broadcast)
//! ```
//!
//! # Modules
//!
//! - `message` - Wire messages (document, loading, error)
//! - `port` - Loopback port allocation by bind attempt
//! - `server` - Broadcast server handle and acceptor thread

pub mod message;
pub mod port;
pub mod server;

pub use server::BroadcastServer;
