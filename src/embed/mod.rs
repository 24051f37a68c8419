//! Embedded static resources.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Client bridge and its bootstrap call, injected into the viewer
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{BOOTSTRAP_JS, BRIDGE_JS, BootstrapVars};
//!
//! let init = BOOTSTRAP_JS.render(&BootstrapVars::new("127.0.0.1", 54321));
//! let script = format!("{BRIDGE_JS}\n{init}");
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// Viewer readiness event the bootstrap waits for by default
    pub const DEFAULT_READY_EVENT: &str = "WebComponentsReady";

    /// Client bridge source. Defines the global `bridge`.
    pub const BRIDGE_JS: &str = include_str!("serve/bridge.js");

    /// Variables for bootstrap.js.
    #[derive(Debug, Clone)]
    pub struct BootstrapVars {
        pub host: String,
        pub port: u16,
        pub ready_event: String,
    }

    impl BootstrapVars {
        pub fn new(host: impl Into<String>, port: u16) -> Self {
            Self {
                host: host.into(),
                port,
                ready_event: DEFAULT_READY_EVENT.to_string(),
            }
        }

        pub fn with_ready_event(mut self, event: impl Into<String>) -> Self {
            self.ready_event = event.into();
            self
        }
    }

    /// Quote as a JS string literal. JSON strings are valid JS.
    fn js_string(s: &str) -> String {
        serde_json::to_string(s).unwrap_or_else(|_| "\"\"".into())
    }

    impl TemplateVars for BootstrapVars {
        fn apply(&self, content: &str) -> String {
            content
                .replace("__LIVEDOC_READY_EVENT__", &js_string(&self.ready_event))
                .replace("__LIVEDOC_HOST__", &js_string(&self.host))
                .replace("__LIVEDOC_PORT__", &self.port.to_string())
        }
    }

    /// Initialization call: connect the bridge once the viewer is ready.
    pub const BOOTSTRAP_JS: Template<BootstrapVars> =
        Template::new(include_str!("serve/bootstrap.js"));
}
