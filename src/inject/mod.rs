//! Script injection into the viewer's entry HTML.
//!
//! Appends one `<script>` as the last child of `<body>`, holding the client
//! bridge followed by a call that connects it to the broadcast server once
//! the viewer signals readiness. The file is rewritten in place, so this
//! must only ever run against a disposable working copy.
//!
//! # Modules
//!
//! - `dom` - Entry page model built from `tl`; splices into the source
//! - `transform` - oxc compatibility pass with fallback

pub mod dom;
pub mod transform;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use crate::core::PreviewError;
use crate::embed::serve::{BOOTSTRAP_JS, BRIDGE_JS, BootstrapVars, DEFAULT_READY_EVENT};
use dom::{Element, HtmlDocument};

/// Injects the bridge bootstrap for one server address
#[derive(Debug, Clone)]
pub struct ScriptInjector {
    host: String,
    port: u16,
    ready_event: String,
    bridge_source: Cow<'static, str>,
}

impl ScriptInjector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ready_event: DEFAULT_READY_EVENT.to_string(),
            bridge_source: Cow::Borrowed(BRIDGE_JS),
        }
    }

    /// Event the bootstrap waits for before connecting
    pub fn with_ready_event(mut self, event: impl Into<String>) -> Self {
        self.ready_event = event.into();
        self
    }

    /// Replace the embedded bridge source
    pub fn with_bridge_source(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.bridge_source = source.into();
        self
    }

    /// Bridge source plus init call, after the compatibility pass
    pub fn script_text(&self) -> String {
        let vars = BootstrapVars::new(self.host.as_str(), self.port)
            .with_ready_event(self.ready_event.as_str());
        let combined = format!("{}\n{}", self.bridge_source, BOOTSTRAP_JS.render(&vars));
        transform::transform_or_original(&combined)
    }

    /// Inject into HTML text. `origin` names the source in errors.
    pub fn inject_str(&self, html: &str, origin: &Path) -> Result<String, PreviewError> {
        let doc = HtmlDocument::parse(html)
            .map_err(|e| PreviewError::Html(origin.to_path_buf(), e))?;

        let script = Element::new("script").with_text(self.script_text());
        doc.append_to_body(&script)
            .ok_or_else(|| PreviewError::MalformedDocument(origin.to_path_buf()))
    }

    /// Rewrite `entry` in place. Nothing is written on error.
    pub fn inject(&self, entry: &Path) -> Result<(), PreviewError> {
        let html = fs::read_to_string(entry).map_err(|e| PreviewError::Io(entry.to_path_buf(), e))?;
        let output = self.inject_str(&html, entry)?;
        fs::write(entry, output).map_err(|e| PreviewError::Io(entry.to_path_buf(), e))?;

        crate::debug!("inject"; "bridge for {}:{} -> {}", self.host, self.port, entry.display());
        Ok(())
    }
}
