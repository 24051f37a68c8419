//! Actor System for Live Preview
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> ChangeCoordinator --> WsActor --> viewers
//! (watch)     (produce document)   (broadcast)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `coordinator` - Loading -> produce -> document/error sequencing
//! - `ws` - WebSocket broadcast and last-message replay

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::ChangeCoordinator;
