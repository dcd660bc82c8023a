//! `synthesize` step, ported from `core/steps/synthesize.py`.
//!
//! Burns whatever subtitle track is current in `ctx` (translated, if a
//! `translate` step ran before this one; the original transcript
//! otherwise) into the video produced by `download`.

use async_trait::async_trait;
use crate::pipeline::context::PipelineContext;
use crate::registry::steps::Step;
use crate::support::{cancellation_probe, progress_callback};
use crate::task_manager::TaskManager;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_worker::{Synthesizer, SynthesizeRequest};
use serde_json::Value;
use std::sync::Arc;

pub struct SynthesizeStep {
    synthesizer: Arc<dyn Synthesizer>,
}

impl SynthesizeStep {
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl Step for SynthesizeStep {
    fn name(&self) -> &'static str {
        "synthesize"
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
                    "synthesize step requires 'video_path' (or result from download step)",
                )
            })?;
        let subtitle_path = params
            .get("subtitle_path")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| ctx.get_str("srt_path").map(str::to_string))
            .ok_or_else(|| {
                OrchestrationError::validation(
                    "synthesize step requires 'subtitle_path' (or a prior transcribe/translate result)",
                )
            })?;
        let destination_dir = params
            .get("destination_dir")
            .and_then(Value::as_str)
            .unwrap_or("/tmp")
            .to_string();

        let outcome = self
            .synthesizer
            .synthesize(SynthesizeRequest {
                video_path,
                subtitle_path,
                destination_dir,
                progress: progress_callback(task_manager.clone(), task_id),
                cancelled: cancellation_probe(task_manager.clone(), task_id),
            })
            .await
            .map_err(|e| OrchestrationError::worker(e.to_string()))?;

        ctx.set("output_video_path", outcome.output_video_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;
    use mediaflow_worker::stub::StubSynthesizer;
    use serde_json::json;

    #[tokio::test]
    async fn synthesize_step_reads_video_and_srt_from_context() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = SynthesizeStep::new(Arc::new(StubSynthesizer));
        let mut ctx = PipelineContext::new();
        ctx.set("video_path", "/work/abc.mp4");
        ctx.set("srt_path", "/work/abc.translated.srt");

        step.execute(
            &mut ctx,
            &json!({"destination_dir": "/work"}),
            None,
            &tm,
        )
        .await
        .unwrap();

        assert_eq!(
            ctx.get_str("output_video_path"),
            Some("/work/abc.subtitled.mp4")
        );
    }

    #[tokio::test]
    async fn synthesize_step_requires_subtitle_path() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = SynthesizeStep::new(Arc::new(StubSynthesizer));
        let mut ctx = PipelineContext::new();
        ctx.set("video_path", "/work/abc.mp4");

        let err = step
            .execute(&mut ctx, &json!({}), None, &tm)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }
}
