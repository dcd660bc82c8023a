//! Fan-out of Task state changes to connected observers.
//!
//! Connections are identified by an opaque [`ConnectionId`] rather than
//! by socket identity — the reference implementation compares `WebSocket`
//! objects directly, which Rust's `axum` socket handle does not support
//! once split into a sink/stream pair.

use axum::extract::ws::{Message, WebSocket};
use dashmap::DashMap;
use futures::stream::SplitSink;
use futures::SinkExt;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::messages::NotifierMessage;
use mediaflow_shared::Task;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registry of live observer connections plus the broadcast/unicast
/// operations the Task Manager drives it with.
#[derive(Debug, Default)]
pub struct Notifier {
    connections: DashMap<ConnectionId, Mutex<SplitSink<WebSocket, Message>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already-accepted connection's outbound sink.
    pub fn connect(&self, id: ConnectionId, sink: SplitSink<WebSocket, Message>) {
        self.connections.insert(id, Mutex::new(sink));
        info!(connection_id = %id, total = self.connections.len(), "observer connected");
    }

    /// Idempotent — absent ids are simply ignored.
    pub fn disconnect(&self, id: ConnectionId) {
        if self.connections.remove(&id).is_some() {
            info!(connection_id = %id, total = self.connections.len(), "observer disconnected");
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Unicast the initial state to one connection. A send failure is
    /// propagated so the caller can tear the connection down.
    pub async fn send_snapshot(&self, id: ConnectionId, tasks: Vec<Task>) -> OrchestrationResult<()> {
        let entry = self
            .connections
            .get(&id)
            .ok_or_else(|| OrchestrationError::notifier("connection not registered"))?;
        let message = NotifierMessage::Snapshot { tasks };
        let text = serde_json::to_string(&message).map_err(|e| OrchestrationError::notifier(e.to_string()))?;
        let mut sink = entry.value().lock().await;
        sink.send(Message::Text(text.into()))
            .await
            .map_err(|e| OrchestrationError::notifier(e.to_string()))
    }

    /// Broadcast a message to every live connection, in registration
    /// iteration order. Connections whose send fails are collected and
    /// dropped only after the full iteration completes, so a failure
    /// mid-broadcast never mutates the live set being iterated.
    pub async fn broadcast(&self, message: NotifierMessage) {
        let text = match serde_json::to_string(&message) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "failed to serialize notifier message, dropping broadcast");
                return;
            }
        };

        let mut failed = Vec::new();
        for entry in self.connections.iter() {
            let id = *entry.key();
            let mut sink = entry.value().lock().await;
            if let Err(e) = sink.send(Message::Text(text.clone().into())).await {
                warn!(connection_id = %id, error = %e, "failed to send to observer");
                failed.push(id);
            }
        }

        for id in failed {
            self.disconnect(id);
        }
    }
}
