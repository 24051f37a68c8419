//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! enable = true     # regenerate and push on file changes
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub enable: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}
