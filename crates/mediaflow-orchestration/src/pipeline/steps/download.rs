//! `download` step, ported from `core/steps/download.py`.

use async_trait::async_trait;
use crate::pipeline::context::PipelineContext;
use crate::registry::steps::Step;
use crate::support::{cancellation_probe, progress_callback};
use crate::task_manager::TaskManager;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_worker::{DownloadRequest, Downloader};
use serde_json::Value;
use std::sync::Arc;

pub struct DownloadStep {
    downloader: Arc<dyn Downloader>,
}

impl DownloadStep {
    pub fn new(downloader: Arc<dyn Downloader>) -> Self {
        Self { downloader }
    }
}

#[async_trait]
impl Step for DownloadStep {
    fn name(&self) -> &'static str {
        "download"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        params: &Value,
        task_id: Option<&str>,
        task_manager: &Arc<TaskManager>,
    ) -> OrchestrationResult<()> {
        let url = params
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| OrchestrationError::validation("download step requires a 'url' param"))?
            .to_string();
        let destination_dir = params
            .get("destination_dir")
            .and_then(Value::as_str)
            .unwrap_or("/tmp")
            .to_string();

        let outcome = self
            .downloader
            .download(DownloadRequest {
                url,
                destination_dir,
                progress: progress_callback(task_manager.clone(), task_id),
                cancelled: cancellation_probe(task_manager.clone(), task_id),
            })
            .await
            .map_err(|e| OrchestrationError::worker(e.to_string()))?;

        ctx.set("video_path", outcome.video_path);
        ctx.set("title", outcome.title.clone());
        ctx.set("media_filename", outcome.title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;
    use mediaflow_worker::stub::StubDownloader;
    use serde_json::json;

    #[tokio::test]
    async fn download_step_populates_video_path_in_context() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let id = tm.create("pipeline", None, None, None).await.unwrap();
        let step = DownloadStep::new(Arc::new(StubDownloader));
        let mut ctx = PipelineContext::new();

        step.execute(
            &mut ctx,
            &json!({"url": "https://example.com/watch/abc", "destination_dir": "/work"}),
            Some(id.as_str()),
            &tm,
        )
        .await
        .unwrap();

        assert_eq!(ctx.get_str("video_path"), Some("/work/abc.mp4"));
    }

    #[tokio::test]
    async fn download_step_requires_url() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = DownloadStep::new(Arc::new(StubDownloader));
        let mut ctx = PipelineContext::new();

        let err = step
            .execute(&mut ctx, &json!({}), None, &tm)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }
}
