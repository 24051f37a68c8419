use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::delivery::{Delivery, deliver};
use super::{RegisteredClient, WsActor};

/// Poll interval of the reader thread
const READ_POLL: Duration = Duration::from_millis(50);

impl WsActor {
    /// Register a client whose handshake already completed.
    ///
    /// The last message, if any, goes to this client only.
    pub(super) fn add_client(&self, mut ws: WebSocket<TcpStream>) {
        if let Err(e) = ws.get_ref().set_nonblocking(true) {
            crate::log!("ws"; "failed to configure client socket: {}", e);
            return;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        if let Some(last) = &self.last {
            match deliver(&mut ws, &last.frame) {
                Delivery::Failed => {
                    crate::debug!("ws"; "client #{} dropped during replay", id);
                    return;
                }
                _ => crate::debug!("ws"; "replayed {} to client #{}", last.message.kind(), id),
            }
        }

        let mut clients = self.clients.lock();
        clients.push(RegisteredClient { id, ws });
        crate::debug!("ws"; "client #{} connected (total: {})", id, clients.len());
    }

    /// Background thread to detect closed clients (non-blocking poll)
    ///
    /// Viewers never send data, so any text frame is ignored. Reads also let
    /// tungstenite answer pings and flush frames queued by `deliver`.
    pub(super) fn client_reader_loop(
        clients: Arc<Mutex<Vec<RegisteredClient>>>,
        running: Arc<AtomicBool>,
    ) {
        while running.load(Ordering::SeqCst) {
            std::thread::sleep(READ_POLL);

            let mut clients_guard = clients.lock();
            clients_guard.retain_mut(|client| match client.ws.read() {
                Ok(Message::Close(_)) => {
                    crate::debug!("ws"; "client #{} closed", client.id);
                    false
                }
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == ErrorKind::WouldBlock => true,
                Err(e) => {
                    crate::debug!("ws"; "client #{} dropped: {}", client.id, e);
                    false
                }
            });
        }
    }
}
