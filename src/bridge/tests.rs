use std::net::{Ipv4Addr, TcpListener};
use std::time::Duration;

use serde_json::{Value, json};

use super::*;
use crate::reload::BroadcastServer;
use crate::reload::port::DEFAULT_PORT_RANGE;

#[derive(Debug, Clone, PartialEq)]
enum Event {
    ShowSpinner,
    HideSpinner,
    Toast(String),
    Overlay(String),
    RemoveOverlay,
    Assign(Value),
}

/// Records every call. Assigning a document resets the position, as a real
/// viewer re-render would.
#[derive(Debug, Default)]
struct RecordingSurface {
    events: Vec<Event>,
    position: NavPosition,
    document: Option<Value>,
    spinner: bool,
    overlay: Option<String>,
}

impl ViewerSurface for RecordingSurface {
    fn show_spinner(&mut self) {
        self.spinner = true;
        self.events.push(Event::ShowSpinner);
    }

    fn hide_spinner(&mut self) {
        self.spinner = false;
        self.events.push(Event::HideSpinner);
    }

    fn show_toast(&mut self, text: &str) {
        self.events.push(Event::Toast(text.to_string()));
    }

    fn show_overlay(&mut self, text: &str) {
        self.overlay = Some(text.to_string());
        self.events.push(Event::Overlay(text.to_string()));
    }

    fn remove_overlay(&mut self) {
        self.overlay = None;
        self.events.push(Event::RemoveOverlay);
    }

    fn position(&self) -> NavPosition {
        self.position.clone()
    }

    fn set_position(&mut self, position: &NavPosition) {
        self.position = position.clone();
    }

    fn assign_document(&mut self, doc: &Value) {
        self.document = Some(doc.clone());
        self.position = NavPosition::default();
        self.events.push(Event::Assign(doc.clone()));
    }
}

type Bridge = ClientBridge<RecordingSurface>;

fn user_position() -> NavPosition {
    NavPosition {
        page: Some("method".into()),
        path: Some("/users/{id}".into()),
        scroll_offset: 320.0,
    }
}

// =============================================================================
// State machine
// =============================================================================

#[test]
fn test_starts_disconnected_without_saved_position() {
    let bridge = ClientBridge::new(RecordingSurface::default());
    assert_eq!(bridge.state(), BridgeState::Disconnected);
    assert!(bridge.saved_position().is_none());
}

#[test]
fn test_document_preserves_position() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.surface_mut().position = user_position();

    bridge.handle_message(Message::loading());
    assert_eq!(bridge.state(), BridgeState::Loading);
    assert!(bridge.surface().spinner);

    bridge.handle_message(Message::document(json!({"title": "x"})));
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert!(!bridge.surface().spinner);
    assert_eq!(bridge.surface().document, Some(json!({"title": "x"})));
    assert_eq!(bridge.surface().position, user_position());
    assert_eq!(bridge.saved_position(), Some(&user_position()));
}

#[test]
fn test_warning_shows_toast_and_keeps_document() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.handle_message(Message::document(json!({"v": 1})));
    bridge.handle_message(Message::loading());
    bridge.handle_message(Message::error(ErrorLevel::Warning, "slow producer"));

    assert_eq!(bridge.state(), BridgeState::ErrorToast);
    assert!(!bridge.surface().spinner);
    assert!(bridge.surface().overlay.is_none());
    assert_eq!(bridge.surface().document, Some(json!({"v": 1})));
    assert_eq!(
        bridge.surface().events.last(),
        Some(&Event::Toast("slow producer".into()))
    );
}

#[test]
fn test_document_lifts_critical_overlay() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.handle_message(Message::error(ErrorLevel::Critical, "API error: bad"));
    assert_eq!(bridge.state(), BridgeState::ErrorFatal);
    assert_eq!(bridge.surface().overlay.as_deref(), Some("API error: bad"));

    bridge.handle_message(Message::document(json!({})));
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert!(bridge.surface().overlay.is_none());

    // Overlay goes before the document lands
    let events = &bridge.surface().events;
    let removed = events.iter().position(|e| *e == Event::RemoveOverlay).unwrap();
    let assigned = events.iter().position(|e| matches!(e, Event::Assign(_))).unwrap();
    assert!(removed < assigned);
}

#[test]
fn test_second_critical_replaces_overlay() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.handle_message(Message::error(ErrorLevel::Critical, "first"));
    bridge.handle_message(Message::error(ErrorLevel::Critical, "second"));
    assert_eq!(bridge.surface().overlay.as_deref(), Some("second"));
}

#[test]
fn test_empty_error_text_gets_placeholder() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.handle_message(Message::error(ErrorLevel::Warning, ""));
    assert_eq!(
        bridge.surface().events.last(),
        Some(&Event::Toast(UNKNOWN_ERROR.into()))
    );
}

#[test]
fn test_close_is_terminal() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.handle_message(Message::loading());
    bridge.handle_close();

    assert_eq!(bridge.state(), BridgeState::ErrorFatal);
    assert!(!bridge.surface().spinner);
    assert_eq!(bridge.surface().overlay.as_deref(), Some(CLOSED_MESSAGE));

    bridge.handle_message(Message::document(json!({"late": true})));
    assert_eq!(bridge.state(), BridgeState::ErrorFatal);
    assert_eq!(bridge.surface().document, None);
    assert_eq!(bridge.surface().overlay.as_deref(), Some(CLOSED_MESSAGE));
}

#[test]
fn test_unparseable_frame_is_ignored() {
    let mut bridge = ClientBridge::new(RecordingSurface::default());
    bridge.handle_text("{\"payload\":\"unknown\"}");
    bridge.handle_text("garbage");
    assert_eq!(bridge.state(), BridgeState::Disconnected);
    assert!(bridge.surface().events.is_empty());
}

// =============================================================================
// Against a live BroadcastServer
// =============================================================================

async fn connect(port: u16) -> Bridge {
    tokio::task::spawn_blocking(move || {
        let mut bridge = ClientBridge::new(RecordingSurface::default());
        bridge.connect("127.0.0.1", port).unwrap();
        assert_eq!(bridge.state(), BridgeState::Connected);
        bridge
    })
    .await
    .unwrap()
}

/// Poll until one frame has been applied.
async fn next_frame(mut bridge: Bridge) -> Bridge {
    tokio::task::spawn_blocking(move || {
        for _ in 0..50 {
            if bridge.poll(Duration::from_millis(100)).unwrap() {
                return bridge;
            }
        }
        panic!("no frame received");
    })
    .await
    .unwrap()
}

async fn wait_for_clients(server: &BroadcastServer, n: usize) {
    for _ in 0..250 {
        if server.client_count().await.unwrap() == n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {n} registered clients");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_late_joiner_enters_fatal_overlay() {
    let server = BroadcastServer::start(DEFAULT_PORT_RANGE).await.unwrap();
    server
        .send_error(ErrorLevel::Critical, "bad input")
        .await
        .unwrap();

    let bridge = next_frame(connect(server.port()).await).await;
    assert_eq!(bridge.state(), BridgeState::ErrorFatal);
    assert_eq!(bridge.surface().overlay.as_deref(), Some("bad input"));

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_refresh_cycle_keeps_position() {
    let server = BroadcastServer::start(DEFAULT_PORT_RANGE).await.unwrap();
    server.send_document(json!({"title": "v1"})).await.unwrap();

    let mut bridge = next_frame(connect(server.port()).await).await;
    assert_eq!(bridge.state(), BridgeState::Idle);
    bridge.surface_mut().position = user_position();

    server.send_loading().await.unwrap();
    let bridge = next_frame(bridge).await;
    assert_eq!(bridge.state(), BridgeState::Loading);

    server.send_document(json!({"title": "x"})).await.unwrap();
    let bridge = next_frame(bridge).await;
    assert_eq!(bridge.state(), BridgeState::Idle);
    assert_eq!(bridge.surface().document, Some(json!({"title": "x"})));
    assert_eq!(bridge.surface().position, user_position());

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_reconnect_replaces_socket() {
    let server = BroadcastServer::start(DEFAULT_PORT_RANGE).await.unwrap();
    let port = server.port();
    let bridge = connect(port).await;
    wait_for_clients(&server, 1).await;

    let bridge = tokio::task::spawn_blocking(move || {
        let mut bridge = bridge;
        bridge.connect("127.0.0.1", port).unwrap();
        bridge
    })
    .await
    .unwrap();
    assert!(bridge.is_connected());

    // Old socket is dropped by the server, new one stays
    tokio::time::sleep(Duration::from_millis(300)).await;
    wait_for_clients(&server, 1).await;

    server.send_loading().await.unwrap();
    let bridge = next_frame(bridge).await;
    assert_eq!(bridge.state(), BridgeState::Loading);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_shutdown_shows_closed_overlay() {
    let server = BroadcastServer::start(DEFAULT_PORT_RANGE).await.unwrap();
    let bridge = connect(server.port()).await;
    wait_for_clients(&server, 1).await;

    server.shutdown().await;

    let bridge = next_frame(bridge).await;
    assert_eq!(bridge.state(), BridgeState::ErrorFatal);
    assert_eq!(bridge.surface().overlay.as_deref(), Some(CLOSED_MESSAGE));
    assert!(!bridge.is_connected());
}

#[test]
fn test_connect_refused() {
    let port = {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut bridge = ClientBridge::new(RecordingSurface::default());
    let err = bridge.connect("127.0.0.1", port).unwrap_err();
    assert!(matches!(err, BridgeError::Connect(..)));
    assert_eq!(bridge.state(), BridgeState::Disconnected);
}
