//! Native WebSocket transport for [`ClientBridge`].

use std::io::ErrorKind;
use std::net::TcpStream;
use std::time::Duration;

use thiserror::Error;
use tungstenite::WebSocket;
use tungstenite::protocol::Message as Frame;

use super::{BridgeState, ClientBridge, ViewerSurface};

pub(super) type Socket = WebSocket<TcpStream>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to connect to {0}")]
    Connect(String, #[source] std::io::Error),

    #[error("handshake with {0} failed: {1}")]
    Handshake(String, String),

    #[error("not connected")]
    NotConnected,
}

impl<S: ViewerSurface> ClientBridge<S> {
    /// Open `ws://host:port`, closing any previous socket first.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), BridgeError> {
        if let Some(mut old) = self.socket.take() {
            crate::debug!("bridge"; "closing previous socket");
            let _ = old.close(None);
            let _ = old.flush();
        }

        self.state = BridgeState::Connecting;
        let url = format!("ws://{host}:{port}");

        let stream = match TcpStream::connect((host, port)) {
            Ok(stream) => stream,
            Err(e) => {
                self.state = BridgeState::Disconnected;
                return Err(BridgeError::Connect(url, e));
            }
        };

        match tungstenite::client(url.as_str(), stream) {
            Ok((ws, _)) => {
                self.socket = Some(ws);
                self.state = BridgeState::Connected;
                crate::debug!("bridge"; "connected to {}", url);
                Ok(())
            }
            Err(e) => {
                self.state = BridgeState::Disconnected;
                Err(BridgeError::Handshake(url, e.to_string()))
            }
        }
    }

    /// Wait up to `timeout` for one frame and apply it.
    ///
    /// Returns `Ok(false)` on timeout. A closed or failed socket goes through
    /// [`ClientBridge::handle_close`].
    pub fn poll(&mut self, timeout: Duration) -> Result<bool, BridgeError> {
        let socket = self.socket.as_mut().ok_or(BridgeError::NotConnected)?;
        let _ = socket.get_ref().set_read_timeout(Some(timeout));

        match socket.read() {
            Ok(Frame::Text(text)) => {
                self.handle_text(text.as_str());
                Ok(true)
            }
            Ok(Frame::Close(_)) => {
                self.handle_close();
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                Ok(false)
            }
            Err(e) => {
                crate::debug!("bridge"; "socket error: {}", e);
                self.handle_close();
                Ok(true)
            }
        }
    }

    /// Whether a socket is currently open
    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }
}
