//! `transcribe` step, ported from `core/steps/transcribe.py`.

use async_trait::async_trait;
use crate::pipeline::context::PipelineContext;
use crate::registry::steps::Step;
use crate::support::{cancellation_probe, progress_callback};
use crate::task_manager::TaskManager;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_worker::{TranscribeRequest, Transcriber};
use serde_json::Value;
use std::sync::Arc;

pub struct TranscribeStep {
    transcriber: Arc<dyn Transcriber>,
}

impl TranscribeStep {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl Step for TranscribeStep {
    fn name(&self) -> &'static str {
        "transcribe"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        params: &Value,
        task_id: Option<&str>,
        task_manager: &Arc<TaskManager>,
    ) -> OrchestrationResult<()> {
        let video_path = params
            .get("video_path")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| ctx.get_str("video_path").map(str::to_string))
            .ok_or_else(|| {
                OrchestrationError::validation(
                    "transcribe step requires 'video_path' (or result from download step)",
                )
            })?;
        let language_hint = params
            .get("language")
            .and_then(Value::as_str)
            .map(str::to_string);

        let outcome = self
            .transcriber
            .transcribe(TranscribeRequest {
                video_path,
                language_hint,
                progress: progress_callback(task_manager.clone(), task_id),
                cancelled: cancellation_probe(task_manager.clone(), task_id),
            })
            .await
            .map_err(|e| OrchestrationError::worker(e.to_string()))?;

        ctx.set("srt_path", outcome.srt_path);
        ctx.set(
            "transcript",
            outcome
                .segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        );
        ctx.set("segments", outcome.segments);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;
    use mediaflow_worker::stub::StubTranscriber;
    use serde_json::json;

    #[tokio::test]
    async fn transcribe_step_falls_back_to_download_output() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = TranscribeStep::new(Arc::new(StubTranscriber));
        let mut ctx = PipelineContext::new();
        ctx.set("video_path", "/work/abc.mp4");

        step.execute(&mut ctx, &json!({}), None, &tm).await.unwrap();

        assert_eq!(ctx.get_str("srt_path"), Some("/work/abc.srt"));
        assert!(ctx.get("segments").is_some());
    }

    #[tokio::test]
    async fn transcribe_step_requires_video_path_or_prior_download() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = TranscribeStep::new(Arc::new(StubTranscriber));
        let mut ctx = PipelineContext::new();

        let err = step.execute(&mut ctx, &json!({}), None, &tm).await.unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }
}
