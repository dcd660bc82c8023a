//! Resume handler for `task_type == "synthesis"`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::TaskResult;
use mediaflow_worker::{SynthesizeRequest, Synthesizer};

use crate::background::BackgroundTaskRunner;
use crate::registry::handlers::ResumeHandler;
use crate::support::cancellation_probe;
use crate::task_manager::TaskManager;

pub struct SynthesisHandler {
    synthesizer: Arc<dyn Synthesizer>,
}

impl SynthesisHandler {
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self { synthesizer }
    }
}

#[async_trait]
impl ResumeHandler for SynthesisHandler {
    fn task_type(&self) -> &'static str {
        "synthesis"
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
            .ok_or_else(|| OrchestrationError::validation("synthesize request_params missing 'video_path'"))?
            .to_string();
        let subtitle_path = request_params
            .get("subtitle_path")
            .and_then(Value::as_str)
            .ok_or_else(|| OrchestrationError::validation("synthesize request_params missing 'subtitle_path'"))?
            .to_string();
        let destination_dir = request_params
            .get("destination_dir")
            .and_then(Value::as_str)
            .unwrap_or("/tmp")
            .to_string();

        let synthesizer = self.synthesizer.clone();
        let task_manager = task_manager.clone();
        let task_id = task_id.to_string();
        let task_id_for_run = task_id.clone();

        tokio::spawn(async move {
            let cancelled = cancellation_probe(task_manager.clone(), Some(task_id.as_str()));
            let _ = BackgroundTaskRunner::run(
                task_manager,
                task_id_for_run,
                "Synthesizing video...",
                "Synthesis complete",
                move |progress| async move {
                    synthesizer
                        .synthesize(SynthesizeRequest {
                            video_path,
                            subtitle_path,
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
