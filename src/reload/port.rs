//! Port allocation for the preview WebSocket server.
//!
//! Binding is the reservation: the listener that won the scan is handed
//! back to the caller, there is no separate check step.

use std::net::{Ipv4Addr, TcpListener};
use std::ops::RangeInclusive;

use crate::core::PreviewError;

/// Registered/dynamic port range used by default.
pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 49152..=65535;

/// Bind the first free loopback port in `range`, scanning ascending.
pub fn allocate(range: RangeInclusive<u16>) -> Result<(TcpListener, u16), PreviewError> {
    let (low, high) = (*range.start(), *range.end());

    for port in range {
        match TcpListener::bind((Ipv4Addr::LOCALHOST, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr().map(|a| a.port()).unwrap_or(port);
                crate::debug!("reload"; "bound port {}", actual_port);
                return Ok((listener, actual_port));
            }
            Err(_) => continue,
        }
    }

    Err(PreviewError::NoPortAvailable { low, high })
}
