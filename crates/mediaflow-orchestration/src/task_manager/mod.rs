//! Authoritative custodian of Task state.

mod dedupe;

pub use dedupe::{dedupe_key, DedupeKey};

use crate::notifier::Notifier;
use crate::persistence::TaskStore;
use dashmap::DashMap;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::messages::NotifierMessage;
use mediaflow_shared::{Task, TaskResult, TaskStatus};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Whitelisted mutable fields for [`TaskManager::update`] — only these
/// fields are assignable through an update. `None` means
/// "leave unchanged" — no caller in this codebase needs to clear
/// `error`/`result` through `update`; that only happens via `reset`.
#[derive(Debug, Default, Clone)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub result: Option<TaskResult>,
    pub cancelled: Option<bool>,
}

impl TaskUpdate {
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn result(mut self, result: TaskResult) -> Self {
        self.result = Some(result);
        self
    }
}

pub(crate) fn now_unix() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

fn generate_task_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

pub struct TaskManager {
    store: Arc<dyn TaskStore>,
    cache: DashMap<String, Task>,
    notifier: std::sync::RwLock<Option<Arc<Notifier>>>,
    /// Serializes every mutating operation so the store write, cache
    /// write, and emission that make up one operation are linearizable
    /// with respect to concurrent callers.
    write_lock: Mutex<()>,
}

impl TaskManager {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            notifier: std::sync::RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    pub fn set_notifier(&self, notifier: Arc<Notifier>) {
        *self.notifier.write().expect("notifier lock poisoned") = Some(notifier);
    }

    async fn emit_update(&self, task: Task) {
        if let Some(notifier) = self.current_notifier() {
            notifier.broadcast(NotifierMessage::Update { task }).await;
        }
    }

    async fn emit_delete(&self, task_id: String) {
        if let Some(notifier) = self.current_notifier() {
            notifier.broadcast(NotifierMessage::Delete { task_id }).await;
        }
    }

    async fn emit_snapshot(&self) {
        if let Some(notifier) = self.current_notifier() {
            notifier
                .broadcast(NotifierMessage::Snapshot { tasks: self.list() })
                .await;
        }
    }

    fn current_notifier(&self) -> Option<Arc<Notifier>> {
        self.notifier.read().expect("notifier lock poisoned").clone()
    }

    /// Load every persisted Task; any left `running`/`pending` from a
    /// prior process are promoted to `paused` with `cancelled = true`
    /// Runs once at startup to recover from an unclean shutdown.
    pub async fn init(&self) -> OrchestrationResult<()> {
        let tasks = self.store.list_all().await?;
        let mut interrupted = Vec::new();

        for mut task in tasks {
            if matches!(task.status, TaskStatus::Running | TaskStatus::Pending) {
                task.status = TaskStatus::Paused;
                task.message = "Interrupted by restart".to_string();
                task.cancelled = true;
                interrupted.push(task.clone());
            }
            self.cache.insert(task.id.clone(), task);
        }

        // All-or-nothing: either every interrupted task is durably
        // promoted to `paused`, or none are — a partial batch would
        // leave the cache (already updated above) inconsistent with
        // the store.
        self.store.update_many(&interrupted).await?;

        info!(
            loaded = self.cache.len(),
            interrupted = interrupted.len(),
            "task manager recovered from store"
        );
        Ok(())
    }

    pub async fn create(
        &self,
        task_type: impl Into<String>,
        name: Option<String>,
        initial_message: Option<String>,
        request_params: Option<Value>,
    ) -> OrchestrationResult<String> {
        let task_type = task_type.into();
        if task_type.trim().is_empty() {
            return Err(OrchestrationError::validation("task type is required"));
        }

        let _guard = self.write_lock.lock().await;

        let id = generate_task_id();
        let name = name.unwrap_or_else(|| format!("{} {}", capitalize(&task_type), id));
        let message = initial_message.unwrap_or_else(|| "Pending...".to_string());
        let request_params = request_params.unwrap_or_else(|| Value::Object(Default::default()));

        let task = Task {
            id: id.clone(),
            name,
            task_type,
            status: TaskStatus::Pending,
            progress: 0.0,
            message,
            error: None,
            result: None,
            request_params,
            created_at: now_unix(),
            cancelled: false,
        };

        // Store-first: every cache entry is backed by a store entry.
        self.store.insert(&task).await?;
        self.cache.insert(id.clone(), task.clone());
        self.emit_update(task).await;
        Ok(id)
    }

    pub async fn update(&self, id: &str, fields: TaskUpdate) -> OrchestrationResult<()> {
        let _guard = self.write_lock.lock().await;

        let Some(mut task) = self.cache.get(id).map(|e| e.value().clone()) else {
            // Unknown id: short-circuit, matching the boundary case of a
            // worker posting progress for a task deleted out from under it.
            return Ok(());
        };

        if let Some(status) = fields.status {
            // Once cancelled, a task may never be revived by a stale
            // in-flight update.
            let forbidden_revival = task.status == TaskStatus::Cancelled
                && matches!(status, TaskStatus::Running | TaskStatus::Completed);
            if !forbidden_revival {
                task.status = status;
            }
        }
        if let Some(progress) = fields.progress {
            task.progress = Task::clamp_progress(progress);
        }
        if let Some(message) = fields.message {
            task.message = message;
        }
        if let Some(error) = fields.error {
            task.error = Some(error);
        }
        if let Some(result) = fields.result {
            task.result = Some(result);
        }
        if let Some(cancelled) = fields.cancelled {
            task.cancelled = cancelled;
        }

        self.store.update(&task).await?;
        self.cache.insert(id.to_string(), task.clone());
        self.emit_update(task).await;
        Ok(())
    }

    pub async fn cancel(&self, id: &str) -> OrchestrationResult<()> {
        let _guard = self.write_lock.lock().await;

        let Some(mut task) = self.cache.get(id).map(|e| e.value().clone()) else {
            return Ok(());
        };
        task.cancelled = true;
        task.status = TaskStatus::Cancelled;

        self.store.update(&task).await?;
        self.cache.insert(id.to_string(), task.clone());
        self.emit_update(task).await;
        Ok(())
    }

    pub async fn cancel_all(&self) -> OrchestrationResult<usize> {
        let _guard = self.write_lock.lock().await;

        let targets: Vec<Task> = self
            .cache
            .iter()
            .map(|e| e.value().clone())
            .filter(|t| t.status.is_active() && !t.cancelled)
            .map(|mut task| {
                task.cancelled = true;
                task.status = TaskStatus::Cancelled;
                task
            })
            .collect();

        // Single transactional commit, per spec: a failure partway
        // through would otherwise leave some tasks durably cancelled
        // and others not, with the cache split the same way.
        self.store.update_many(&targets).await?;
        for task in &targets {
            self.cache.insert(task.id.clone(), task.clone());
        }

        let count = targets.len();
        if count > 0 {
            self.emit_snapshot().await;
        }
        Ok(count)
    }

    pub async fn delete(&self, id: &str) -> OrchestrationResult<bool> {
        let _guard = self.write_lock.lock().await;

        let removed = self.store.delete(id).await?;
        self.cache.remove(id);
        if removed {
            self.emit_delete(id.to_string()).await;
        }
        Ok(removed)
    }

    pub async fn delete_all(&self) -> OrchestrationResult<usize> {
        let _guard = self.write_lock.lock().await;

        if self.cache.is_empty() {
            return Ok(0);
        }
        let count = self.store.delete_all().await?;
        self.cache.clear();
        self.emit_snapshot().await;
        Ok(count)
    }

    pub async fn reset(&self, id: &str) -> OrchestrationResult<()> {
        let _guard = self.write_lock.lock().await;

        let Some(mut task) = self.cache.get(id).map(|e| e.value().clone()) else {
            return Ok(());
        };
        task.status = TaskStatus::Pending;
        task.progress = 0.0;
        task.message = "Resuming...".to_string();
        task.error = None;
        task.result = None;
        task.cancelled = false;
        task.created_at = now_unix();

        self.store.update(&task).await?;
        self.cache.insert(id.to_string(), task.clone());
        self.emit_update(task).await;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.cache.get(id).map(|e| e.value().clone())
    }

    pub fn list(&self) -> Vec<Task> {
        self.cache.iter().map(|e| e.value().clone()).collect()
    }

    /// JSON-serializable form for initial observer sync — `Vec<Task>`
    /// already serializes directly, so this is an alias of `list`.
    pub fn snapshot(&self) -> Vec<Task> {
        self.list()
    }

    pub fn find_task_by_params(&self, task_type: &str, params: &Value) -> Option<String> {
        if params.is_null() {
            return None;
        }
        let target = dedupe_key(params);
        self.cache
            .iter()
            .find(|entry| {
                let task = entry.value();
                task.task_type == task_type
                    && !task.request_params.is_null()
                    && dedupe_key(&task.request_params) == target
            })
            .map(|entry| entry.key().clone())
    }

    pub fn is_cancelled(&self, id: &str) -> bool {
        self.cache.get(id).map(|e| e.value().cancelled).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{InMemoryTaskStore, TaskStore};
    use serde_json::json;

    fn manager() -> TaskManager {
        TaskManager::new(Arc::new(InMemoryTaskStore::new()))
    }

    #[tokio::test]
    async fn create_returns_a_pending_zero_progress_task() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        let task = tm.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert!(!task.cancelled);
    }

    #[tokio::test]
    async fn create_rejects_empty_type() {
        let tm = manager();
        let err = tm.create("", None, None, None).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }

    #[tokio::test]
    async fn update_clamps_progress_and_is_noop_for_unknown_id() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        tm.update(&id, TaskUpdate::default().progress(250.0))
            .await
            .unwrap();
        assert_eq!(tm.get(&id).unwrap().progress, 100.0);

        // Unknown id: no error, no panic.
        tm.update("missing1", TaskUpdate::default().progress(10.0))
            .await
            .unwrap();
        assert!(tm.get("missing1").is_none());
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        tm.cancel(&id).await.unwrap();
        tm.cancel(&id).await.unwrap();
        assert!(tm.is_cancelled(&id));
        assert_eq!(tm.get(&id).unwrap().status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancelled_task_cannot_be_revived_by_a_stale_update() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        tm.cancel(&id).await.unwrap();
        tm.update(&id, TaskUpdate::default().status(TaskStatus::Running))
            .await
            .unwrap();
        assert_eq!(tm.get(&id).unwrap().status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_all_only_targets_active_uncancelled_tasks() {
        let tm = manager();
        let pending = tm.create("download", None, None, None).await.unwrap();
        let already_cancelled = tm.create("download", None, None, None).await.unwrap();
        tm.cancel(&already_cancelled).await.unwrap();
        let completed = tm.create("download", None, None, None).await.unwrap();
        tm.update(&completed, TaskUpdate::default().status(TaskStatus::Completed))
            .await
            .unwrap();

        let count = tm.cancel_all().await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(tm.get(&pending).unwrap().status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn delete_removes_from_cache_and_store() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        assert!(tm.delete(&id).await.unwrap());
        assert!(tm.get(&id).is_none());
        assert!(!tm.delete(&id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_all_on_empty_manager_is_a_cheap_noop() {
        let tm = manager();
        assert_eq!(tm.delete_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reset_reinitializes_a_terminal_task() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        tm.update(
            &id,
            TaskUpdate::default()
                .status(TaskStatus::Completed)
                .progress(100.0),
        )
        .await
        .unwrap();

        tm.reset(&id).await.unwrap();
        let task = tm.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0.0);
        assert_eq!(task.message, "Resuming...");
        assert!(task.result.is_none());
        assert!(!task.cancelled);
    }

    #[tokio::test]
    async fn find_task_by_params_dedupes_on_download_url() {
        let tm = manager();
        let params = json!({"steps": [{"step_name": "download", "params": {"url": "https://x/y"}}]});
        let id = tm
            .create("pipeline", None, None, Some(params.clone()))
            .await
            .unwrap();

        let found = tm.find_task_by_params("pipeline", &params);
        assert_eq!(found, Some(id));
    }

    #[tokio::test]
    async fn find_task_by_params_ignores_other_task_types() {
        let tm = manager();
        let params = json!({"url": "https://x/y"});
        tm.create("download", None, None, Some(params.clone()))
            .await
            .unwrap();

        assert_eq!(tm.find_task_by_params("transcribe", &params), None);
    }

    #[tokio::test]
    async fn init_promotes_running_and_pending_tasks_to_paused() {
        let store = Arc::new(InMemoryTaskStore::new());
        let running = Task {
            id: "running1".to_string(),
            name: "Running".to_string(),
            task_type: "download".to_string(),
            status: TaskStatus::Running,
            progress: 40.0,
            message: "working".to_string(),
            error: None,
            result: None,
            request_params: json!({}),
            created_at: now_unix(),
            cancelled: false,
        };
        store.insert(&running).await.unwrap();

        let tm = TaskManager::new(store);
        tm.init().await.unwrap();

        let recovered = tm.get("running1").unwrap();
        assert_eq!(recovered.status, TaskStatus::Paused);
        assert!(recovered.cancelled);
        assert_eq!(recovered.message, "Interrupted by restart");
    }
}
