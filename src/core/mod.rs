//! Core types - process state and session errors shared across the codebase.

mod error;
mod state;

pub use error::PreviewError;
pub use state::{is_shutdown, register_session, setup_shutdown_handler};
