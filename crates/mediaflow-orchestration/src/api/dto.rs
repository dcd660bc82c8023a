//! Request/response shapes for the HTTP surface, validated the way the
//! teacher validates inbound gRPC messages — here with the `validator`
//! crate instead, since the transport is JSON over HTTP.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::pipeline::PipelineStepRequest;
use mediaflow_shared::Task;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PipelineSubmitRequest {
    // No `length(min = 1)` here: spec.md §8 requires an empty `steps`
    // list to reach the Pipeline Runner, which completes it immediately
    // with an empty history and trace rather than rejecting it.
    pub steps: Vec<PipelineStepRequest>,
    #[serde(default)]
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TranscribeSubmitRequest {
    #[validate(length(min = 1, message = "video_path must not be empty"))]
    pub video_path: String,
    #[serde(default)]
    pub language_hint: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SynthesisSubmitRequest {
    #[validate(length(min = 1, message = "video_path must not be empty"))]
    pub video_path: String,
    #[validate(length(min = 1, message = "subtitle_path must not be empty"))]
    pub subtitle_path: String,
    #[serde(default)]
    pub destination_dir: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnhanceSubmitRequest {
    #[validate(length(min = 1, message = "video_path must not be empty"))]
    pub video_path: String,
    #[serde(default)]
    pub destination_dir: Option<String>,
    #[serde(default)]
    pub scale_factor: Option<u32>,
    #[serde(default)]
    pub task_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CleanSubmitRequest {
    #[validate(length(min = 1, message = "video_path must not be empty"))]
    pub video_path: String,
    #[serde(default)]
    pub destination_dir: Option<String>,
    #[serde(default)]
    pub task_name: Option<String>,
}

/// Shared shape every submission endpoint returns (spec §6.1).
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub task_id: String,
    pub status: String,
    pub message: String,
}

impl SubmitResponse {
    pub fn new(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status.to_string(),
            message: task.message.clone(),
        }
    }

    pub fn deduped(task: &Task) -> Self {
        Self {
            task_id: task.id.clone(),
            status: task.status.to_string(),
            message: "Task already active".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeResponse {
    pub status: String,
}

pub fn into_pipeline_params(request: &PipelineSubmitRequest) -> Value {
    serde_json::json!({
        "steps": request.steps,
        "task_name": request.task_name,
    })
}
