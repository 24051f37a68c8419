//! Session-level error types.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal preview errors. Any of these aborts the session.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Every port in the configured range is already bound.
    #[error("no free port in range {low}-{high}")]
    NoPortAvailable { low: u16, high: u16 },

    /// The injection target has no `<body>` element.
    #[error("`{0}` has no <body> element")]
    MalformedDocument(PathBuf),

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    /// The HTML parser rejected the input outright.
    #[error("failed to parse `{0}`: {1}")]
    Html(PathBuf, String),

    /// The broadcast actor is gone (server already shut down).
    #[error("broadcast server is not running")]
    ServerStopped,
}
