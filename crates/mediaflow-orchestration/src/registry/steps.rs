//! Step trait and string-keyed Step Registry.

use crate::pipeline::context::PipelineContext;
use crate::task_manager::TaskManager;
use async_trait::async_trait;
use dashmap::DashMap;
use mediaflow_shared::error::{OrchestrationError, OrchestrationResult};
use serde_json::Value;
use std::sync::Arc;

/// A named unit of work inside a pipeline. Steps read inputs from `ctx`
/// and/or `params` and write outputs to `ctx`; they report progress
/// through the Task Manager when given a `task_id`.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(
        &self,
        ctx: &mut PipelineContext,
        params: &Value,
        task_id: Option<&str>,
        task_manager: &Arc<TaskManager>,
    ) -> OrchestrationResult<()>;
}

/// String-keyed map of step-name → step instance.
#[derive(Default)]
pub struct StepRegistry {
    steps: DashMap<&'static str, Arc<dyn Step>>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, step: Arc<dyn Step>) {
        self.steps.insert(step.name(), step);
    }

    pub fn get(&self, name: &str) -> OrchestrationResult<Arc<dyn Step>> {
        self.steps
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| OrchestrationError::not_found("step", name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.steps.contains_key(name)
    }
}
