use std::io::ErrorKind;
use std::net::TcpStream;

use tungstenite::protocol::Message;
use tungstenite::{Utf8Bytes, WebSocket};

use super::WsActor;

/// Outcome of a single best-effort send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Delivery {
    /// Frame fully written
    Sent,
    /// Socket buffer full; frame stays queued in tungstenite and is flushed
    /// by later writes or reads
    Queued,
    /// Connection is closing, frame skipped
    Skipped,
    /// Write failed, client must be dropped
    Failed,
}

/// Send one frame without blocking the caller.
pub(super) fn deliver(ws: &mut WebSocket<TcpStream>, frame: &Utf8Bytes) -> Delivery {
    if !ws.can_write() {
        return Delivery::Skipped;
    }

    match ws.send(Message::Text(frame.clone())) {
        Ok(()) => Delivery::Sent,
        Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => {
            Delivery::Queued
        }
        Err(e) => {
            crate::debug!("ws"; "send failed: {}", e);
            Delivery::Failed
        }
    }
}

impl WsActor {
    /// Broadcast a frame to all connected clients
    pub(super) fn broadcast(&self, frame: &Utf8Bytes) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        clients.retain_mut(|client| match deliver(&mut client.ws, frame) {
            Delivery::Failed => {
                crate::debug!("ws"; "client #{} disconnected", client.id);
                false
            }
            _ => true,
        });
        crate::debug!("ws"; "broadcast to {} clients", count);
    }
}
