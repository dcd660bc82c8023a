//! The uniform adapter used by single-step (non-pipeline) task
//! submissions: runs a blocking/long-lived worker off the serving task,
//! bridges its progress callback into Task Manager updates, and
//! normalizes success/failure into a terminal Task update.

use std::future::Future;
use std::sync::Arc;

use mediaflow_shared::error::OrchestrationResult;
use mediaflow_shared::{TaskResult, TaskStatus};
use mediaflow_worker::ProgressCallback;

use crate::support::progress_callback;
use crate::task_manager::{TaskManager, TaskUpdate};

/// Stateless namespace for the single `run` entry point — there is
/// nothing to construct; every invocation is independent.
pub struct BackgroundTaskRunner;

impl BackgroundTaskRunner {
    /// Runs `worker` on a detached `tokio` task so the caller (an HTTP
    /// handler or resume Handler) never blocks on it. `worker` receives
    /// the progress callback the way the reference passes it as an
    /// injected kwarg; `result_transformer` shapes the raw return value
    /// into a [`TaskResult`].
    ///
    /// Returns `Err` only if a Task Manager write itself fails
    /// (persistence error) — a worker exception is always captured on
    /// the Task rather than propagated.
    pub async fn run<F, Fut, T, E>(
        task_manager: Arc<TaskManager>,
        task_id: String,
        start_message: impl Into<String>,
        success_message: impl Into<String>,
        worker: F,
        result_transformer: impl FnOnce(T) -> TaskResult + Send + 'static,
    ) -> OrchestrationResult<()>
    where
        F: FnOnce(ProgressCallback) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        task_manager
            .update(
                &task_id,
                TaskUpdate::default()
                    .status(TaskStatus::Running)
                    .message(start_message.into()),
            )
            .await?;

        let progress = progress_callback(task_manager.clone(), Some(task_id.as_str()));
        let handle = tokio::spawn(async move { worker(progress).await });

        match handle.await {
            Ok(Ok(raw)) => {
                let result = result_transformer(raw);
                task_manager
                    .update(
                        &task_id,
                        TaskUpdate::default()
                            .status(TaskStatus::Completed)
                            .progress(100.0)
                            .message(success_message.into())
                            .result(result),
                    )
                    .await
            }
            Ok(Err(worker_err)) => {
                let message = worker_err.to_string();
                // A worker that returns its own error after the flag was
                // set is still cooperative cancellation, not failure.
                let status = if task_manager.is_cancelled(&task_id) {
                    TaskStatus::Cancelled
                } else {
                    TaskStatus::Failed
                };
                task_manager
                    .update(
                        &task_id,
                        TaskUpdate::default()
                            .status(status)
                            .error(message.clone())
                            .message(message),
                    )
                    .await
            }
            Err(join_err) => {
                let message = format!("worker task did not complete: {join_err}");
                task_manager
                    .update(
                        &task_id,
                        TaskUpdate::default()
                            .status(TaskStatus::Failed)
                            .error(message.clone())
                            .message(message),
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;

    fn manager() -> Arc<TaskManager> {
        Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())))
    }

    #[tokio::test]
    async fn successful_worker_completes_the_task_with_transformed_result() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();

        BackgroundTaskRunner::run(
            tm.clone(),
            id.clone(),
            "Starting...",
            "Done",
            |progress: ProgressCallback| async move {
                progress(50.0, "halfway");
                Ok::<_, String>(42u32)
            },
            |raw: u32| {
                let mut result = TaskResult::new(true);
                result
                    .meta
                    .insert("value".to_string(), serde_json::json!(raw));
                result
            },
        )
        .await
        .unwrap();

        let task = tm.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.progress, 100.0);
        assert_eq!(task.result.unwrap().meta["value"], 42);
    }

    #[tokio::test]
    async fn failing_worker_fails_the_task_when_not_cancelled() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();

        BackgroundTaskRunner::run(
            tm.clone(),
            id.clone(),
            "Starting...",
            "Done",
            |_progress: ProgressCallback| async move { Err::<u32, _>("boom".to_string()) },
            |_raw: u32| TaskResult::new(true),
        )
        .await
        .unwrap();

        let task = tm.get(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn failing_worker_after_cancellation_lands_on_cancelled() {
        let tm = manager();
        let id = tm.create("download", None, None, None).await.unwrap();
        tm.cancel(&id).await.unwrap();

        BackgroundTaskRunner::run(
            tm.clone(),
            id.clone(),
            "Starting...",
            "Done",
            |_progress: ProgressCallback| async move { Err::<u32, _>("stopped".to_string()) },
            |_raw: u32| TaskResult::new(true),
        )
        .await
        .unwrap();

        assert_eq!(tm.get(&id).unwrap().status, TaskStatus::Cancelled);
    }
}
