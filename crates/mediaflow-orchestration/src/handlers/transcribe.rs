//! Resume handler for `task_type == "transcribe"`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::TaskResult;
use mediaflow_worker::{TranscribeRequest, Transcriber};

use crate::background::BackgroundTaskRunner;
use crate::registry::handlers::ResumeHandler;
use crate::support::cancellation_probe;
use crate::task_manager::TaskManager;

pub struct TranscribeHandler {
    transcriber: Arc<dyn Transcriber>,
}

impl TranscribeHandler {
    pub fn new(transcriber: Arc<dyn Transcriber>) -> Self {
        Self { transcriber }
    }
}

#[async_trait]
impl ResumeHandler for TranscribeHandler {
    fn task_type(&self) -> &'static str {
        "transcribe"
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
            .ok_or_else(|| OrchestrationError::validation("transcribe request_params missing 'video_path'"))?
            .to_string();
        let language_hint = request_params
            .get("language_hint")
            .and_then(Value::as_str)
            .map(str::to_string);

        let transcriber = self.transcriber.clone();
        let task_manager = task_manager.clone();
        let task_id = task_id.to_string();
        let task_id_for_run = task_id.clone();

        tokio::spawn(async move {
            let cancelled = cancellation_probe(task_manager.clone(), Some(task_id.as_str()));
            let _ = BackgroundTaskRunner::run(
                task_manager,
                task_id_for_run,
                "Transcribing audio...",
                "Transcription complete",
                move |progress| async move {
                    transcriber
                        .transcribe(TranscribeRequest {
                            video_path,
                            language_hint,
                            progress,
                            cancelled,
                        })
                        .await
                },
                |outcome| {
                    let mut result = TaskResult::new(true);
                    result
                        .meta
                        .insert("srt_path".to_string(), serde_json::json!(outcome.srt_path));
                    result.meta.insert(
                        "detected_language".to_string(),
                        serde_json::json!(outcome.detected_language),
                    );
                    result
                        .files
                        .push(mediaflow_shared::FileRef::new("subtitle", outcome.srt_path));
                    result
                },
            )
            .await;
        });
        Ok(())
    }
}
