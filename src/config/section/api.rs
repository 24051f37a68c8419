//! `[api]` section configuration.
//!
//! Where the pushed document comes from.
//!
//! # Example
//!
//! ```toml
//! [api]
//! entry = "api.json"                  # JSON or TOML document, relative to root
//! command = ["node", "build-api.js"]  # optional, prints the JSON document on stdout
//! label = "API"                       # error prefix: "API error: ..."
//! ```
//!
//! When `command` is non-empty it takes precedence over `entry`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub entry: PathBuf,
    pub command: Vec<String>,
    pub label: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("api.json"),
            command: Vec::new(),
            label: "API".into(),
        }
    }
}

impl ApiConfig {
    pub fn uses_command(&self) -> bool {
        !self.command.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_api_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.api.entry, PathBuf::from("api.json"));
        assert!(!config.api.uses_command());
        assert_eq!(config.api.label, "API");
    }

    #[test]
    fn test_api_command() {
        let config = test_parse_config("[api]\ncommand = [\"node\", \"build-api.js\"]\nlabel = \"RAML\"");
        assert!(config.api.uses_command());
        assert_eq!(config.api.command, vec!["node", "build-api.js"]);
        assert_eq!(config.api.label, "RAML");
    }
}
