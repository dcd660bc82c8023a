//! Shared state every Axum handler is given through the `State` extractor.

use std::sync::Arc;

use crate::notifier::Notifier;
use crate::pipeline::PipelineRunner;
use crate::registry::handlers::HandlerRegistry;
use crate::task_manager::TaskManager;

#[derive(Clone)]
pub struct AppState {
    pub task_manager: Arc<TaskManager>,
    pub notifier: Arc<Notifier>,
    pub pipeline_runner: Arc<PipelineRunner>,
    pub handlers: Arc<HandlerRegistry>,
}

impl AppState {
    pub fn new(
        task_manager: Arc<TaskManager>,
        notifier: Arc<Notifier>,
        pipeline_runner: Arc<PipelineRunner>,
        handlers: Arc<HandlerRegistry>,
    ) -> Self {
        Self {
            task_manager,
            notifier,
            pipeline_runner,
            handlers,
        }
    }
}
