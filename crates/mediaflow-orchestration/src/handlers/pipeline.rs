//! Resume handler for `task_type == "pipeline"`, and the fallback used
//! for any task type without a dedicated handler (spec §4.5 step 4).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};

use crate::pipeline::{PipelineRequestParams, PipelineRunner};
use crate::registry::handlers::ResumeHandler;
use crate::task_manager::TaskManager;

pub struct PipelineHandler {
    runner: Arc<PipelineRunner>,
}

impl PipelineHandler {
    pub fn new(runner: Arc<PipelineRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ResumeHandler for PipelineHandler {
    fn task_type(&self) -> &'static str {
        "pipeline"
    }

    async fn resume(
        &self,
        task_manager: &Arc<TaskManager>,
        task_id: &str,
        request_params: &Value,
    ) -> OrchestrationResult<()> {
        let params: PipelineRequestParams = serde_json::from_value(request_params.clone())
            .map_err(|e| OrchestrationError::validation(format!("invalid pipeline request_params: {e}")))?;

        let task_manager = task_manager.clone();
        let task_id = task_id.to_string();
        let runner = self.runner.clone();
        tokio::spawn(async move {
            let _ = runner.run(&task_manager, &task_id, params.steps).await;
        });
        Ok(())
    }
}
