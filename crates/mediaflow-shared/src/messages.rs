//! Wire messages pushed to observers over the Notifier.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// A message the Notifier broadcasts (or unicasts, for `Snapshot`) to
/// observer connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotifierMessage {
    Snapshot { tasks: Vec<Task> },
    Update { task: Task },
    Delete { task_id: String },
}

/// An inbound message a connected observer may send:
/// `{ action: "cancel", task_id }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ObserverCommand {
    Cancel { task_id: String },
}
