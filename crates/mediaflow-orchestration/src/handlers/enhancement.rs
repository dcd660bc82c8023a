//! Resume handler for `task_type == "enhancement"`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::TaskResult;
use mediaflow_worker::{EnhanceRequest, Enhancer};

use crate::background::BackgroundTaskRunner;
use crate::registry::handlers::ResumeHandler;
use crate::support::cancellation_probe;
use crate::task_manager::TaskManager;

pub struct EnhancementHandler {
    enhancer: Arc<dyn Enhancer>,
}

impl EnhancementHandler {
    pub fn new(enhancer: Arc<dyn Enhancer>) -> Self {
        Self { enhancer }
    }
}

#[async_trait]
impl ResumeHandler for EnhancementHandler {
    fn task_type(&self) -> &'static str {
        "enhancement"
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
            .ok_or_else(|| OrchestrationError::validation("enhance request_params missing 'video_path'"))?
            .to_string();
        let destination_dir = request_params
            .get("destination_dir")
            .and_then(Value::as_str)
            .unwrap_or("/tmp")
            .to_string();
        let scale_factor = request_params
            .get("scale_factor")
            .and_then(Value::as_u64)
            .unwrap_or(2) as u32;

        let enhancer = self.enhancer.clone();
        let task_manager = task_manager.clone();
        let task_id = task_id.to_string();
        let task_id_for_run = task_id.clone();

        tokio::spawn(async move {
            let cancelled = cancellation_probe(task_manager.clone(), Some(task_id.as_str()));
            let _ = BackgroundTaskRunner::run(
                task_manager,
                task_id_for_run,
                "Enhancing video...",
                "Enhancement complete",
                move |progress| async move {
                    enhancer
                        .enhance(EnhanceRequest {
                            video_path,
                            destination_dir,
                            scale_factor,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;
    use mediaflow_shared::TaskStatus;
    use mediaflow_worker::stub::StubEnhancer;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn resume_enhances_and_completes() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let id = tm
            .create(
                "enhancement",
                None,
                None,
                Some(json!({"video_path": "/work/abc.mp4", "scale_factor": 4})),
            )
            .await
            .unwrap();

        let handler = EnhancementHandler::new(Arc::new(StubEnhancer));
        let task = tm.get(&id).unwrap();
        handler
            .resume(&tm, &id, &task.request_params)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tm.get(&id).unwrap().status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn resume_rejects_missing_video_path() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let id = tm.create("enhancement", None, None, Some(json!({}))).await.unwrap();
        let handler = EnhancementHandler::new(Arc::new(StubEnhancer));
        let task = tm.get(&id).unwrap();

        let err = handler
            .resume(&tm, &id, &task.request_params)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }
}
