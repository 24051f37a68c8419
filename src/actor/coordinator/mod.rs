//! Change Coordinator - Regenerate and Broadcast
//!
//! Turns change events into the broadcast sequence
//! `loading -> document` or `loading -> error`.
//!
//! # Serialization
//!
//! At most one production runs at a time. Changes that arrive meanwhile only
//! mark the slot as pending. When the running production finishes with the
//! slot pending, its result is dropped (it describes an older file state)
//! and a fresh production starts. A stale document therefore never lands
//! after a newer `loading`.
//!
//! ```text
//! Changed ─┬─ idle ──> send_loading, spawn produce
//!          └─ busy ──> pending = true
//! finished ┬─ pending ──> drop result, spawn produce
//!          └─ else ────> send_document | send_error(critical)
//! ```

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::messages::CoordinatorMsg;
use crate::logger::{status_error, status_success};
use crate::produce::{DocumentProducer, ProduceError};
use crate::reload::BroadcastServer;
use crate::reload::message::ErrorLevel;

type Production = JoinHandle<Result<Value, ProduceError>>;

/// ChangeCoordinator - serializes regenerations and publishes outcomes
pub struct ChangeCoordinator {
    rx: mpsc::Receiver<CoordinatorMsg>,
    server: BroadcastServer,
    producer: Arc<dyn DocumentProducer>,
}

impl ChangeCoordinator {
    pub fn new(
        rx: mpsc::Receiver<CoordinatorMsg>,
        server: BroadcastServer,
        producer: Arc<dyn DocumentProducer>,
    ) -> Self {
        Self {
            rx,
            server,
            producer,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        let mut in_flight: Option<Production> = None;
        let mut pending = false;

        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(CoordinatorMsg::Changed(paths)) => {
                        log_changes(&paths);
                        if in_flight.is_some() {
                            pending = true;
                        } else if !self.begin(&mut in_flight).await {
                            break;
                        }
                    }
                    Some(CoordinatorMsg::Shutdown) | None => break,
                },

                result = finish(&mut in_flight), if in_flight.is_some() => {
                    in_flight = None;

                    if pending {
                        pending = false;
                        crate::debug!("watch"; "result superseded, regenerating");
                        if !self.begin(&mut in_flight).await {
                            break;
                        }
                        continue;
                    }

                    if !self.publish(result).await {
                        break;
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            handle.abort();
        }
        crate::debug!("watch"; "coordinator stopped");
    }

    /// Announce loading and start a production. `false` if the server is gone.
    async fn begin(&self, in_flight: &mut Option<Production>) -> bool {
        if self.server.send_loading().await.is_err() {
            return false;
        }

        let producer = Arc::clone(&self.producer);
        *in_flight = Some(tokio::task::spawn_blocking(move || producer.produce()));
        true
    }

    /// Broadcast the outcome. `false` if the server is gone.
    async fn publish(&self, result: Result<Value, ProduceError>) -> bool {
        let sent = match result {
            Ok(doc) => {
                status_success("document updated");
                self.server.send_document(doc).await
            }
            Err(e) => {
                let message = format!("{} error: {}", self.producer.name(), e);
                status_error("regeneration failed", &message);
                self.server.send_error(ErrorLevel::Critical, message).await
            }
        };
        sent.is_ok()
    }
}

/// Await the running production. A panicked producer becomes an error.
async fn finish(in_flight: &mut Option<Production>) -> Result<Value, ProduceError> {
    match in_flight.as_mut() {
        Some(handle) => handle.await.unwrap_or(Err(ProduceError::Panicked)),
        None => std::future::pending().await,
    }
}

fn log_changes(paths: &[std::path::PathBuf]) {
    match paths {
        [] => crate::debug!("watch"; "initial regeneration"),
        [one] => crate::log!("watch"; "changed: {}", one.display()),
        many => crate::log!("watch"; "{} files changed", many.len()),
    }
}
