//! `[serve]` section configuration.
//!
//! The static web server that hosts the viewer working copy.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 8080                 # HTTP port, retried upward when taken
//! open = false                # Open the entry page in a browser on start
//! ```

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// Launch the system browser at the entry page once serving.
    pub open: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            open: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.open);
    }

    #[test]
    fn test_serve_config_partial_override() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"\nopen = true");
        assert_eq!(config.serve.interface, IpAddr::V6(Ipv6Addr::LOCALHOST));
        assert_eq!(config.serve.port, 8080);
        assert!(config.serve.open);
    }
}
