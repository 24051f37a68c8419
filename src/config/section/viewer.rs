//! `[viewer]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [viewer]
//! source = "viewer"                   # static viewer files, copied per session
//! main_file = "index.html"            # entry HTML inside the copy
//! ready_event = "WebComponentsReady"  # window event fired once components load
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::embed::serve::DEFAULT_READY_EVENT;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub source: PathBuf,
    pub main_file: PathBuf,
    pub ready_event: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("viewer"),
            main_file: PathBuf::from("index.html"),
            ready_event: DEFAULT_READY_EVENT.into(),
        }
    }
}

impl ViewerConfig {
    pub(crate) fn validate(&self, errors: &mut Vec<String>) {
        if self.main_file.is_absolute() {
            errors.push(format!(
                "viewer.main_file must be relative to the viewer directory, got `{}`",
                self.main_file.display()
            ));
        }
        if self.ready_event.trim().is_empty() {
            errors.push("viewer.ready_event must not be empty".into());
        }
    }
}
