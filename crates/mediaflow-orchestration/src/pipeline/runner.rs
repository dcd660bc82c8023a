//! Executes an ordered list of Pipeline Step requests against a fresh
//! [`PipelineContext`] for a given task id.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::context::PipelineContext;
use crate::registry::steps::{Step, StepRegistry};
use crate::task_manager::{now_unix, TaskManager, TaskUpdate};
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::{FileRef, TaskResult, TaskStatus};

/// One entry of the `steps` array a pipeline submission names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStepRequest {
    pub step_name: String,
    #[serde(default)]
    pub params: Value,
}

/// The full shape of a pipeline task's `request_params` — reconstructed
/// verbatim by [`crate::handlers::PipelineHandler`] on resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRequestParams {
    pub steps: Vec<PipelineStepRequest>,
    #[serde(default)]
    pub task_name: Option<String>,
}

pub struct PipelineRunner {
    steps: Arc<StepRegistry>,
}

impl PipelineRunner {
    pub fn new(steps: Arc<StepRegistry>) -> Self {
        Self { steps }
    }

    /// Runs `steps` in order against a fresh context, updating `task_id`
    /// throughout. Returns the terminal error, if any, after the Task has
    /// already been updated to the matching terminal status.
    pub async fn run(
        &self,
        task_manager: &Arc<TaskManager>,
        task_id: &str,
        steps: Vec<PipelineStepRequest>,
    ) -> OrchestrationResult<()> {
        let mut ctx = PipelineContext::new();

        task_manager
            .update(
                task_id,
                TaskUpdate::default()
                    .status(TaskStatus::Running)
                    .message("Starting pipeline..."),
            )
            .await?;

        for step_request in &steps {
            if task_manager.is_cancelled(task_id) {
                task_manager
                    .update(
                        task_id,
                        TaskUpdate::default()
                            .status(TaskStatus::Cancelled)
                            .message(format!(
                                "Cancelled before step: {}",
                                step_request.step_name
                            )),
                    )
                    .await?;
                return Err(OrchestrationError::cancellation(
                    "pipeline cancelled before next step",
                ));
            }

            task_manager
                .update(
                    task_id,
                    TaskUpdate::default()
                        .message(format!("Executing step: {}", step_request.step_name)),
                )
                .await?;

            let step = match self.steps.get(&step_request.step_name) {
                Ok(step) => step,
                Err(err) => {
                    task_manager
                        .update(
                            task_id,
                            TaskUpdate::default()
                                .status(TaskStatus::Failed)
                                .error(err.to_string())
                                .message(err.to_string()),
                        )
                        .await?;
                    return Err(err);
                }
            };

            let started = Instant::now();
            let outcome = step
                .execute(&mut ctx, &step_request.params, Some(task_id), task_manager)
                .await;
            let elapsed = started.elapsed().as_secs_f64();
            let timestamp = now_unix();

            match outcome {
                Ok(()) => {
                    ctx.history.push(step_request.step_name.clone());
                    ctx.add_trace(
                        step_request.step_name.as_str(),
                        elapsed,
                        "success",
                        None,
                        timestamp,
                    );
                }
                Err(err) => {
                    ctx.add_trace(
                        step_request.step_name.as_str(),
                        elapsed,
                        "failed",
                        Some(err.to_string()),
                        timestamp,
                    );

                    // The step may have failed for an unrelated reason
                    // after `cancel_all` flipped the latch mid-execution;
                    // either way a cancelled task lands on `cancelled`,
                    // never `failed`.
                    if err.is_cancellation() || task_manager.is_cancelled(task_id) {
                        task_manager
                            .update(
                                task_id,
                                TaskUpdate::default().status(TaskStatus::Cancelled).message(
                                    format!("Cancelled during step: {}", step_request.step_name),
                                ),
                            )
                            .await?;
                        return Err(OrchestrationError::cancellation(err.to_string()));
                    }

                    task_manager
                        .update(
                            task_id,
                            TaskUpdate::default()
                                .status(TaskStatus::Failed)
                                .error(err.to_string())
                                .message(err.to_string()),
                        )
                        .await?;
                    return Err(err);
                }
            }
        }

        let result = Self::build_result(&ctx);
        task_manager
            .update(
                task_id,
                TaskUpdate::default()
                    .status(TaskStatus::Completed)
                    .progress(100.0)
                    .message("Pipeline completed successfully")
                    .result(result),
            )
            .await?;
        Ok(())
    }

    /// Normalizes `ctx.data` into a [`TaskResult`]: `meta` carries every
    /// context key plus the execution trace; `files` are derived from
    /// the canonical `video`/`subtitle` context keys (§4.4/§4.7).
    fn build_result(ctx: &PipelineContext) -> TaskResult {
        let mut meta: BTreeMap<String, Value> = ctx.data().clone();
        meta.insert(
            "execution_trace".to_string(),
            serde_json::to_value(&ctx.trace).unwrap_or(Value::Array(Vec::new())),
        );

        let mut files = Vec::new();
        let video_path = ctx
            .get_str("output_video_path")
            .or_else(|| ctx.get_str("video_path"));
        if let Some(path) = video_path {
            files.push(FileRef::new("video", path));
        }
        let subtitle_path = ctx
            .get_str("translated_srt_path")
            .or_else(|| ctx.get_str("srt_path"));
        if let Some(path) = subtitle_path {
            files.push(FileRef::new("subtitle", path));
        }

        TaskResult {
            success: true,
            files,
            meta,
        }
    }
}
