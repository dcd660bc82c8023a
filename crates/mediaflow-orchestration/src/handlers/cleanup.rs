//! Resume handler for `task_type == "cleanup"`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::TaskResult;
use mediaflow_worker::{CleanRequest, Cleaner};

use crate::background::BackgroundTaskRunner;
use crate::registry::handlers::ResumeHandler;
use crate::support::cancellation_probe;
use crate::task_manager::TaskManager;

pub struct CleanupHandler {
    cleaner: Arc<dyn Cleaner>,
}

impl CleanupHandler {
    pub fn new(cleaner: Arc<dyn Cleaner>) -> Self {
        Self { cleaner }
    }
}

#[async_trait]
impl ResumeHandler for CleanupHandler {
    fn task_type(&self) -> &'static str {
        "cleanup"
    }

    async fn resume(
        &self,
        task_manager: &Arc<TaskManager>,
        task_id: &str,
        request_params: &Value,
    ) -> OrchestrationResult<()> {
        let video_path = request_params
            .get("video_path")
            .and_then(Value::as_str)
            .ok_or_else(|| OrchestrationError::validation("clean request_params missing 'video_path'"))?
            .to_string();
        let destination_dir = request_params
            .get("destination_dir")
            .and_then(Value::as_str)
            .unwrap_or("/tmp")
            .to_string();

        let cleaner = self.cleaner.clone();
        let task_manager = task_manager.clone();
        let task_id = task_id.to_string();
        let task_id_for_run = task_id.clone();

        tokio::spawn(async move {
            let cancelled = cancellation_probe(task_manager.clone(), Some(task_id.as_str()));
            let _ = BackgroundTaskRunner::run(
                task_manager,
                task_id_for_run,
                "Cleaning video...",
                "Cleanup complete",
                move |progress| async move {
                    cleaner
                        .clean(CleanRequest {
                            video_path,
                            destination_dir,
                            progress,
                            cancelled,
                        })
                        .await
                },
                |outcome| {
                    let mut result = TaskResult::new(true);
                    result.files.push(mediaflow_shared::FileRef::new(
                        "video",
                        outcome.output_video_path,
                    ));
                    result
                },
            )
            .await;
        });
        Ok(())
    }
}
