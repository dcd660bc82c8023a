//! Axum route table implementing spec §6.1.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use validator::Validate;

use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::Task;

use crate::api::dto::{
    into_pipeline_params, CleanSubmitRequest, CountResponse, EnhanceSubmitRequest, OkResponse,
    PipelineSubmitRequest, ResumeResponse, SubmitResponse, SynthesisSubmitRequest,
    TranscribeSubmitRequest,
};
use crate::api::state::AppState;
use crate::api::ws::ws_handler;
use crate::registry::handlers::resume_task;
use crate::task_manager::TaskManager;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/pipeline/run", post(submit_pipeline))
        .route("/transcribe", post(submit_transcribe))
        .route("/synthesis", post(submit_synthesis))
        .route("/enhancement", post(submit_enhancement))
        .route("/cleanup", post(submit_cleanup))
        .route("/tasks", get(list_tasks))
        .route("/tasks", delete(delete_all_tasks))
        .route("/tasks/{id}", get(get_task))
        .route("/tasks/{id}", delete(delete_task))
        .route("/tasks/cancel-all", post(cancel_all))
        .route("/tasks/{id}/resume", post(resume))
        .route("/ws/tasks", get(ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn validation_error(errors: validator::ValidationErrors) -> OrchestrationError {
    OrchestrationError::validation(errors.to_string())
}

/// Finds or creates the Task for a submission: an active match is
/// returned unchanged and annotated (dedupe debounce); a terminal match
/// is reset in place and re-run (recycle); otherwise a fresh Task is
/// created.
async fn find_or_create(
    task_manager: &TaskManager,
    task_type: &str,
    task_name: Option<String>,
    params: Value,
) -> OrchestrationResult<(String, bool)> {
    if let Some(id) = task_manager.find_task_by_params(task_type, &params) {
        let task = task_manager
            .get(&id)
            .ok_or_else(|| OrchestrationError::not_found("task", &id))?;
        if task.status.is_active() {
            return Ok((id, false));
        }
        task_manager.reset(&id).await?;
        return Ok((id, true));
    }
    let id = task_manager
        .create(task_type.to_string(), task_name, None, Some(params))
        .await?;
    Ok((id, true))
}

fn submit_response(task_manager: &TaskManager, id: &str, fresh: bool) -> OrchestrationResult<SubmitResponse> {
    let task = task_manager
        .get(id)
        .ok_or_else(|| OrchestrationError::not_found("task", id))?;
    Ok(if fresh {
        SubmitResponse::new(&task)
    } else {
        SubmitResponse::deduped(&task)
    })
}

async fn submit_pipeline(
    State(state): State<AppState>,
    Json(request): Json<PipelineSubmitRequest>,
) -> OrchestrationResult<Json<SubmitResponse>> {
    request.validate().map_err(validation_error)?;
    let params = into_pipeline_params(&request);
    let (id, fresh) = find_or_create(&state.task_manager, "pipeline", request.task_name, params).await?;

    if fresh {
        let task_manager = state.task_manager.clone();
        let runner = state.pipeline_runner.clone();
        let steps = request.steps.clone();
        let task_id = id.clone();
        tokio::spawn(async move {
            let _ = runner.run(&task_manager, &task_id, steps).await;
        });
    }

    Ok(Json(submit_response(&state.task_manager, &id, fresh)?))
}

async fn submit_transcribe(
    State(state): State<AppState>,
    Json(request): Json<TranscribeSubmitRequest>,
) -> OrchestrationResult<Json<SubmitResponse>> {
    request.validate().map_err(validation_error)?;
    let params = serde_json::json!({
        "video_path": request.video_path,
        "language_hint": request.language_hint,
    });
    let (id, fresh) =
        find_or_create(&state.task_manager, "transcribe", request.task_name, params).await?;

    if fresh {
        dispatch_resume(&state, "transcribe", &id).await?;
    }
    Ok(Json(submit_response(&state.task_manager, &id, fresh)?))
}

async fn submit_synthesis(
    State(state): State<AppState>,
    Json(request): Json<SynthesisSubmitRequest>,
) -> OrchestrationResult<Json<SubmitResponse>> {
    request.validate().map_err(validation_error)?;
    let params = serde_json::json!({
        "video_path": request.video_path,
        "subtitle_path": request.subtitle_path,
        "destination_dir": request.destination_dir,
    });
    let (id, fresh) =
        find_or_create(&state.task_manager, "synthesis", request.task_name, params).await?;

    if fresh {
        dispatch_resume(&state, "synthesis", &id).await?;
    }
    Ok(Json(submit_response(&state.task_manager, &id, fresh)?))
}

async fn submit_enhancement(
    State(state): State<AppState>,
    Json(request): Json<EnhanceSubmitRequest>,
) -> OrchestrationResult<Json<SubmitResponse>> {
    request.validate().map_err(validation_error)?;
    let params = serde_json::json!({
        "video_path": request.video_path,
        "destination_dir": request.destination_dir,
        "scale_factor": request.scale_factor,
    });
    let (id, fresh) =
        find_or_create(&state.task_manager, "enhancement", request.task_name, params).await?;

    if fresh {
        dispatch_resume(&state, "enhancement", &id).await?;
    }
    Ok(Json(submit_response(&state.task_manager, &id, fresh)?))
}

async fn submit_cleanup(
    State(state): State<AppState>,
    Json(request): Json<CleanSubmitRequest>,
) -> OrchestrationResult<Json<SubmitResponse>> {
    request.validate().map_err(validation_error)?;
    let params = serde_json::json!({
        "video_path": request.video_path,
        "destination_dir": request.destination_dir,
    });
    let (id, fresh) = find_or_create(&state.task_manager, "cleanup", request.task_name, params).await?;

    if fresh {
        dispatch_resume(&state, "cleanup", &id).await?;
    }
    Ok(Json(submit_response(&state.task_manager, &id, fresh)?))
}

/// A freshly created (or recycled) single-type Task is dispatched by
/// driving it through the same resume path a paused task resume would
/// take — both start from a `pending` Task plus its `request_params`.
async fn dispatch_resume(state: &AppState, task_type: &str, task_id: &str) -> OrchestrationResult<()> {
    if state.handlers.get(task_type).is_none() {
        return Err(OrchestrationError::not_found("handler", task_type));
    }
    resume_task(&state.task_manager, &state.handlers, task_id).await
}

async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.task_manager.list())
}

async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> OrchestrationResult<Json<Task>> {
    state
        .task_manager
        .get(&id)
        .map(Json)
        .ok_or_else(|| OrchestrationError::not_found("task", id))
}

async fn cancel_all(State(state): State<AppState>) -> OrchestrationResult<Json<CountResponse>> {
    let count = state.task_manager.cancel_all().await?;
    info!(count, "cancelled all active tasks");
    Ok(Json(CountResponse { count }))
}

async fn resume(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> OrchestrationResult<Json<ResumeResponse>> {
    resume_task(&state.task_manager, &state.handlers, &id).await?;
    let task = state
        .task_manager
        .get(&id)
        .ok_or_else(|| OrchestrationError::not_found("task", &id))?;
    Ok(Json(ResumeResponse {
        status: task.status.to_string(),
    }))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> OrchestrationResult<Json<OkResponse>> {
    let ok = state.task_manager.delete(&id).await?;
    Ok(Json(OkResponse { ok }))
}

async fn delete_all_tasks(State(state): State<AppState>) -> OrchestrationResult<Json<CountResponse>> {
    let count = state.task_manager.delete_all().await?;
    Ok(Json(CountResponse { count }))
}
