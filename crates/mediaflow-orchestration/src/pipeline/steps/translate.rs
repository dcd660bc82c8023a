//! `translate` step, ported from `core/steps/translate.py`.
//!
//! Overwrites `srt_path` with the translated file so the downstream
//! `synthesize` step burns the right subtitles without needing its own
//! translation awareness.

use async_trait::async_trait;
use crate::pipeline::context::PipelineContext;
use crate::registry::steps::Step;
use crate::support::{cancellation_probe, progress_callback};
use crate::task_manager::TaskManager;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_worker::{TranslateRequest, Translator};
use serde_json::Value;
use std::sync::Arc;

pub struct TranslateStep {
    translator: Arc<dyn Translator>,
}

impl TranslateStep {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }
}

#[async_trait]
impl Step for TranslateStep {
    fn name(&self) -> &'static str {
        "translate"
    }

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        params: &Value,
        task_id: Option<&str>,
        task_manager: &Arc<TaskManager>,
    ) -> OrchestrationResult<()> {
        let srt_path = params
            .get("srt_path")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| ctx.get_str("srt_path").map(str::to_string))
            .ok_or_else(|| {
                OrchestrationError::validation(
                    "translate step requires 'srt_path' (or result from transcribe step)",
                )
            })?;
        let target_language = params
            .get("target_language")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                OrchestrationError::validation("translate step requires a 'target_language' param")
            })?
            .to_string();

        let outcome = self
            .translator
            .translate(TranslateRequest {
                srt_path,
                target_language,
                progress: progress_callback(task_manager.clone(), task_id),
                cancelled: cancellation_probe(task_manager.clone(), task_id),
            })
            .await
            .map_err(|e| OrchestrationError::worker(e.to_string()))?;

        // Overwrite, not add alongside: downstream steps only ever look
        // at `srt_path` for "the subtitle track to burn in".
        ctx.set("srt_path", outcome.translated_srt_path.clone());
        ctx.set("translated_srt_path", outcome.translated_srt_path);
        ctx.set("translated_segments", outcome.segments);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;
    use mediaflow_worker::stub::StubTranslator;
    use serde_json::json;

    #[tokio::test]
    async fn translate_step_overwrites_srt_path_for_downstream_steps() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = TranslateStep::new(Arc::new(StubTranslator));
        let mut ctx = PipelineContext::new();
        ctx.set("srt_path", "/work/abc.srt");

        step.execute(
            &mut ctx,
            &json!({"target_language": "es"}),
            None,
            &tm,
        )
        .await
        .unwrap();

        assert_eq!(ctx.get_str("srt_path"), Some("/work/abc.translated.srt"));
        assert_eq!(
            ctx.get_str("translated_srt_path"),
            Some("/work/abc.translated.srt")
        );
    }

    #[tokio::test]
    async fn translate_step_requires_target_language() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = TranslateStep::new(Arc::new(StubTranslator));
        let mut ctx = PipelineContext::new();
        ctx.set("srt_path", "/work/abc.srt");

        let err = step
            .execute(&mut ctx, &json!({}), None, &tm)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }

    #[tokio::test]
    async fn translate_step_requires_srt_path_or_prior_transcribe() {
        let tm = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
        let step = TranslateStep::new(Arc::new(StubTranslator));
        let mut ctx = PipelineContext::new();

        let err = step
            .execute(&mut ctx, &json!({"target_language": "es"}), None, &tm)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Validation(_)));
    }
}
