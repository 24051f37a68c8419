//! Client Bridge - Viewer-Side State Machine
//!
//! Consumes broadcast messages and drives a viewer through a
//! [`ViewerSurface`]. The embedded `bridge.js` is the in-browser twin of
//! this type; this one runs natively (headless viewers, tests).
//!
//! # States
//!
//! ```text
//! Disconnected -> Connecting -> Connected -+-> Loading  <-+
//!                                          +-> Idle     <-+ (per message)
//!                                          +-> ErrorToast
//!                                          +-> ErrorFatal (critical error or socket close)
//! ```
//!
//! A critical error overlay is lifted by the next document. A closed socket
//! is final: the overlay stays and further messages are ignored.

mod socket;

use serde_json::Value;

use crate::reload::message::{ErrorLevel, Message};

pub use socket::BridgeError;

/// Shown when the connection to the preview server is lost
pub const CLOSED_MESSAGE: &str =
    "The preview server is no longer running. Restart it and reload this page.";

/// Shown for errors that arrive without text
const UNKNOWN_ERROR: &str = "Unknown error occurred";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Disconnected,
    Connecting,
    Connected,
    Loading,
    Idle,
    ErrorToast,
    ErrorFatal,
}

/// Where the user is inside the viewer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavPosition {
    pub page: Option<String>,
    pub path: Option<String>,
    pub scroll_offset: f64,
}

/// UI capabilities the bridge needs from the viewer
pub trait ViewerSurface {
    /// Show the progress indicator, reusing it if already present
    fn show_spinner(&mut self);
    fn hide_spinner(&mut self);
    /// Transient, dismissable notice
    fn show_toast(&mut self, text: &str);
    /// Non-dismissable blocking notice
    fn show_overlay(&mut self, text: &str);
    fn remove_overlay(&mut self);
    fn position(&self) -> NavPosition;
    fn set_position(&mut self, position: &NavPosition);
    fn assign_document(&mut self, doc: &Value);
}

pub struct ClientBridge<S: ViewerSurface> {
    surface: S,
    state: BridgeState,
    socket: Option<socket::Socket>,
    /// Position captured right before the latest document swap
    saved_position: Option<NavPosition>,
    overlay_shown: bool,
    /// Socket closed; terminal
    closed: bool,
}

impl<S: ViewerSurface> ClientBridge<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: BridgeState::Disconnected,
            socket: None,
            saved_position: None,
            overlay_shown: false,
            closed: false,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn saved_position(&self) -> Option<&NavPosition> {
        self.saved_position.as_ref()
    }

    /// Apply one server message.
    pub fn handle_message(&mut self, message: Message) {
        if self.closed {
            return;
        }

        match message {
            Message::Loading => {
                self.surface.show_spinner();
                self.state = BridgeState::Loading;
            }
            Message::Document { data } => {
                self.apply_document(&data);
                self.state = BridgeState::Idle;
            }
            Message::Error { level, message } => {
                self.surface.hide_spinner();
                let text = if message.is_empty() {
                    UNKNOWN_ERROR
                } else {
                    message.as_str()
                };
                self.notify_error(level, text);
            }
        }
    }

    /// Apply one raw text frame. Frames that aren't protocol messages are
    /// ignored.
    pub fn handle_text(&mut self, text: &str) {
        match Message::from_json(text) {
            Some(message) => self.handle_message(message),
            None => crate::debug!("bridge"; "ignoring frame: {}", text),
        }
    }

    /// Connection lost. Shows the fixed overlay; no reconnect.
    pub fn handle_close(&mut self) {
        if self.closed {
            return;
        }
        self.socket = None;
        self.surface.hide_spinner();
        self.show_overlay(CLOSED_MESSAGE);
        self.state = BridgeState::ErrorFatal;
        self.closed = true;
    }

    fn notify_error(&mut self, level: ErrorLevel, text: &str) {
        if level.is_critical() {
            self.show_overlay(text);
            self.state = BridgeState::ErrorFatal;
        } else {
            self.surface.show_toast(text);
            self.state = BridgeState::ErrorToast;
        }
    }

    fn show_overlay(&mut self, text: &str) {
        if self.overlay_shown {
            self.surface.remove_overlay();
        }
        self.surface.show_overlay(text);
        self.overlay_shown = true;
    }

    /// Capture, assign, restore, in that order.
    fn apply_document(&mut self, data: &Value) {
        if self.overlay_shown {
            self.surface.remove_overlay();
            self.overlay_shown = false;
        }
        self.surface.hide_spinner();

        let position = self.surface.position();
        self.surface.assign_document(data);
        self.surface.set_position(&position);
        self.saved_position = Some(position);
    }
}

#[cfg(test)]
mod tests;
