//! Handler trait and string-keyed Handler Registry, plus the resume
//! flow (spec §4.5 steps 1-5) that drives them.

use async_trait::async_trait;
use dashmap::DashMap;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use mediaflow_shared::TaskStatus;
use serde_json::Value;
use std::sync::Arc;

use crate::task_manager::TaskManager;

/// Knows how to re-schedule a paused or previously terminal task of a
/// given `type`, reconstructing the original request from
/// `request_params` and dispatching it via the Background Task Runner
/// or the Pipeline Runner.
#[async_trait]
pub trait ResumeHandler: Send + Sync {
    fn task_type(&self) -> &'static str;

    async fn resume(
        &self,
        task_manager: &Arc<TaskManager>,
        task_id: &str,
        request_params: &Value,
    ) -> OrchestrationResult<()>;
}

/// String-keyed map of task-type → resume handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<&'static str, Arc<dyn ResumeHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, handler: Arc<dyn ResumeHandler>) {
        self.handlers.insert(handler.task_type(), handler);
    }

    pub fn get(&self, task_type: &str) -> Option<Arc<dyn ResumeHandler>> {
        self.handlers.get(task_type).map(|entry| entry.value().clone())
    }

    /// Falls back to the generic `pipeline` handler on a miss — resume
    /// step 4.
    pub fn get_or_fallback(&self, task_type: &str) -> OrchestrationResult<Arc<dyn ResumeHandler>> {
        self.get(task_type)
            .or_else(|| self.get("pipeline"))
            .ok_or_else(|| OrchestrationError::not_found("handler", task_type))
    }
}

/// Implements the resume flow: load the task, reject if
/// `request_params` is absent, no-op if already running, reset it
/// (making it observable as pending), then dispatch via the resolved
/// (or fallback) handler.
pub async fn resume_task(
    task_manager: &Arc<TaskManager>,
    handlers: &HandlerRegistry,
    task_id: &str,
) -> OrchestrationResult<()> {
    let task = task_manager
        .get(task_id)
        .ok_or_else(|| OrchestrationError::not_found("task", task_id))?;

    if task.request_params.is_null() {
        return Err(OrchestrationError::validation(
            "task has no request_params to resume from",
        ));
    }
    if task.status == TaskStatus::Running {
        return Ok(());
    }

    task_manager.reset(task_id).await?;

    let handler = handlers.get_or_fallback(&task.task_type)?;
    handler.resume(task_manager, task_id, &task.request_params).await
}
