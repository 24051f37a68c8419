//! `[reload]` section configuration.
//!
//! The push server viewers connect to. It always binds loopback; `host` is
//! only the name the injected bootstrap dials.
//!
//! # Example
//!
//! ```toml
//! [reload]
//! host = "127.0.0.1"
//! port_min = 49152
//! port_max = 65535
//! ```

use std::net::IpAddr;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::reload::port::DEFAULT_PORT_RANGE;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    pub host: String,
    pub port_min: u16,
    pub port_max: u16,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port_min: *DEFAULT_PORT_RANGE.start(),
            port_max: *DEFAULT_PORT_RANGE.end(),
        }
    }
}

impl ReloadConfig {
    pub fn port_range(&self) -> RangeInclusive<u16> {
        self.port_min..=self.port_max
    }

    pub(crate) fn validate(&self, errors: &mut Vec<String>) {
        if self.port_min == 0 {
            errors.push("reload.port_min must be greater than 0".into());
        }
        if self.port_min > self.port_max {
            errors.push(format!(
                "reload.port_min ({}) is greater than reload.port_max ({})",
                self.port_min, self.port_max
            ));
        }
        if !is_loopback_host(&self.host) {
            errors.push(format!(
                "reload.host must be a loopback address, got `{}`",
                self.host
            ));
        }
    }
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    fn errors_for(section: &str) -> Vec<String> {
        let config = test_parse_config(section);
        let mut errors = Vec::new();
        config.reload.validate(&mut errors);
        errors
    }

    #[test]
    fn test_reload_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.reload.port_range(), 49152..=65535);
        assert!(errors_for("").is_empty());
    }

    #[test]
    fn test_inverted_range() {
        let errors = errors_for("[reload]\nport_min = 60000\nport_max = 50000");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("port_min"));
    }

    #[test]
    fn test_zero_port_min() {
        let errors = errors_for("[reload]\nport_min = 0");
        assert!(errors.iter().any(|e| e.contains("greater than 0")));
    }

    #[test]
    fn test_loopback_hosts() {
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("127.1.2.3"));
        assert!(is_loopback_host("::1"));
        assert!(is_loopback_host("[::1]"));
        assert!(!is_loopback_host("0.0.0.0"));
        assert!(!is_loopback_host("192.168.1.10"));
        assert!(!is_loopback_host("example.com"));
    }

    #[test]
    fn test_remote_host_rejected() {
        let errors = errors_for("[reload]\nhost = \"10.0.0.5\"");
        assert!(errors.iter().any(|e| e.contains("loopback")));
    }
}
