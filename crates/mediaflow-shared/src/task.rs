//! The `Task` data model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a [`Task`].
///
/// `Completed`, `Failed`, and `Cancelled` are terminal: per invariant 3,
/// a task only leaves a terminal state via an explicit [`reset`] — never
/// via `update`.
///
/// [`reset`]: crate::task::Task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// `status ∈ {completed, failed, cancelled}` is terminal unless the
    /// task is explicitly reset (invariant 3).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Paused => "paused",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// A single output of a completed task, referenced from `TaskResult.files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRef {
    /// e.g. `"video"`, `"subtitle"`, `"json"`, `"srt"`.
    #[serde(rename = "type")]
    pub file_type: String,
    /// Absolute path to the produced artifact.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FileRef {
    pub fn new(file_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            path: path.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The normalized success payload of a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub success: bool,
    #[serde(default)]
    pub files: Vec<FileRef>,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
}

impl TaskResult {
    pub fn new(success: bool) -> Self {
        Self {
            success,
            files: Vec::new(),
            meta: BTreeMap::new(),
        }
    }
}

/// An individually addressable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub task_type: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    #[serde(default)]
    pub request_params: Value,
    /// Unix timestamp (seconds, fractional), matching the reference
    /// implementation's `time.time()` — reset on [`Task`] reset.
    pub created_at: f64,
    pub cancelled: bool,
}

impl Task {
    /// Clamp a raw progress value into `[0, 100]`.
    pub fn clamp_progress(value: f64) -> f64 {
        value.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Paused.is_terminal());
    }

    #[test]
    fn active_states() {
        assert!(TaskStatus::Pending.is_active());
        assert!(TaskStatus::Running.is_active());
        assert!(!TaskStatus::Paused.is_active());
    }

    #[test]
    fn progress_clamps_to_bounds() {
        assert_eq!(Task::clamp_progress(-5.0), 0.0);
        assert_eq!(Task::clamp_progress(150.0), 100.0);
        assert_eq!(Task::clamp_progress(42.5), 42.5);
    }

    #[test]
    fn status_serializes_snake_case() {
        let s = serde_json::to_string(&TaskStatus::Running).unwrap();
        assert_eq!(s, "\"running\"");
    }

    #[test]
    fn task_round_trips_through_json() {
        let task = Task {
            id: "abcd1234".into(),
            name: "Transcribe abcd1234".into(),
            task_type: "transcribe".into(),
            status: TaskStatus::Pending,
            progress: 0.0,
            message: "Queued".into(),
            error: None,
            result: None,
            request_params: serde_json::json!({"audio_path": "/a.mp3"}),
            created_at: 1_700_000_000.0,
            cancelled: false,
        };
        let encoded = serde_json::to_string(&task).unwrap();
        let decoded: Task = serde_json::from_str(&encoded).unwrap();
        assert_eq!(task, decoded);
    }

    #[test]
    fn file_ref_builder() {
        let f = FileRef::new("video", "/out.mp4").with_label("final");
        assert_eq!(f.file_type, "video");
        assert_eq!(f.label.as_deref(), Some("final"));
    }
}
