//! Wires the Service Container, registries, and Runners into a single
//! [`AppServices`] bundle at startup (spec §5).
//!
//! Rust has no import-time module side effects to auto-populate a
//! registry, so every collaborator, Step, and Handler is registered
//! explicitly here rather than discovered.

use std::sync::Arc;

use mediaflow_shared::error::OrchestrationResult;
use mediaflow_worker::stub::{
    StubCleaner, StubDownloader, StubEnhancer, StubSynthesizer, StubTranscriber, StubTranslator,
};
use mediaflow_worker::{Cleaner, Downloader, Enhancer, Synthesizer, Transcriber, Translator};

use crate::container::{services, ServiceContainer};
use crate::handlers::{
    CleanupHandler, EnhancementHandler, PipelineHandler, SynthesisHandler, TranscribeHandler,
};
use crate::notifier::Notifier;
use crate::persistence::TaskStore;
use crate::pipeline::PipelineRunner;
use crate::pipeline::steps::{DownloadStep, SynthesizeStep, TranscribeStep, TranslateStep};
use crate::registry::handlers::HandlerRegistry;
use crate::registry::steps::StepRegistry;
use crate::task_manager::TaskManager;

/// Every collaborating service a running process needs, bundled so
/// `main` and integration tests can construct the whole graph in one
/// call.
pub struct AppServices {
    pub container: Arc<ServiceContainer>,
    pub task_manager: Arc<TaskManager>,
    pub notifier: Arc<Notifier>,
    pub steps: Arc<StepRegistry>,
    pub handlers: Arc<HandlerRegistry>,
    pub pipeline_runner: Arc<PipelineRunner>,
}

/// Registers the bundled stub collaborators. A production deployment
/// swaps this for real adapters behind the same traits; nothing above
/// the [`ServiceContainer`] boundary would need to change.
fn register_collaborators(container: &ServiceContainer) {
    container.register::<Arc<dyn Downloader>, _>(services::DOWNLOADER, || {
        Arc::new(StubDownloader) as Arc<dyn Downloader>
    });
    container.register::<Arc<dyn Transcriber>, _>(services::TRANSCRIBER, || {
        Arc::new(StubTranscriber) as Arc<dyn Transcriber>
    });
    container.register::<Arc<dyn Translator>, _>(services::TRANSLATOR, || {
        Arc::new(StubTranslator) as Arc<dyn Translator>
    });
    container.register::<Arc<dyn Synthesizer>, _>(services::SYNTHESIZER, || {
        Arc::new(StubSynthesizer) as Arc<dyn Synthesizer>
    });
    container.register::<Arc<dyn Enhancer>, _>(services::ENHANCER, || {
        Arc::new(StubEnhancer) as Arc<dyn Enhancer>
    });
    container.register::<Arc<dyn Cleaner>, _>(services::CLEANER, || {
        Arc::new(StubCleaner) as Arc<dyn Cleaner>
    });
}

/// Builds the full service graph: collaborators, Task Manager,
/// Notifier (wired to the Task Manager via setter injection to break
/// the cycle), Step/Handler registries, and the Pipeline Runner.
pub async fn register_all_services(store: Arc<dyn TaskStore>) -> OrchestrationResult<AppServices> {
    let container = Arc::new(ServiceContainer::new());
    register_collaborators(&container);

    let task_manager = Arc::new(TaskManager::new(store));
    task_manager.init().await?;

    let notifier = Arc::new(Notifier::new());
    task_manager.set_notifier(notifier.clone());

    container.override_instance(services::TASK_MANAGER, task_manager.clone());
    container.override_instance(services::NOTIFIER, notifier.clone());

    let downloader = container.get::<Arc<dyn Downloader>>(services::DOWNLOADER)?;
    let transcriber = container.get::<Arc<dyn Transcriber>>(services::TRANSCRIBER)?;
    let translator = container.get::<Arc<dyn Translator>>(services::TRANSLATOR)?;
    let synthesizer = container.get::<Arc<dyn Synthesizer>>(services::SYNTHESIZER)?;
    let enhancer = container.get::<Arc<dyn Enhancer>>(services::ENHANCER)?;
    let cleaner = container.get::<Arc<dyn Cleaner>>(services::CLEANER)?;

    let steps = Arc::new(StepRegistry::new());
    steps.register(Arc::new(DownloadStep::new((*downloader).clone())));
    steps.register(Arc::new(TranscribeStep::new((*transcriber).clone())));
    steps.register(Arc::new(TranslateStep::new((*translator).clone())));
    steps.register(Arc::new(SynthesizeStep::new((*synthesizer).clone())));

    let pipeline_runner = Arc::new(PipelineRunner::new(steps.clone()));

    let handlers = Arc::new(HandlerRegistry::new());
    handlers.register(Arc::new(PipelineHandler::new(pipeline_runner.clone())));
    handlers.register(Arc::new(TranscribeHandler::new((*transcriber).clone())));
    handlers.register(Arc::new(SynthesisHandler::new((*synthesizer).clone())));
    handlers.register(Arc::new(EnhancementHandler::new((*enhancer).clone())));
    handlers.register(Arc::new(CleanupHandler::new((*cleaner).clone())));

    Ok(AppServices {
        container,
        task_manager,
        notifier,
        steps,
        handlers,
        pipeline_runner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryTaskStore;

    #[tokio::test]
    async fn register_all_services_wires_a_usable_graph() {
        let services = register_all_services(Arc::new(InMemoryTaskStore::new()))
            .await
            .unwrap();

        assert!(services.steps.contains("download"));
        assert!(services.steps.contains("transcribe"));
        assert!(services.steps.contains("translate"));
        assert!(services.steps.contains("synthesize"));
        assert!(services.handlers.get("pipeline").is_some());
        assert!(services.handlers.get("transcribe").is_some());

        let id = services
            .task_manager
            .create("pipeline", None, None, None)
            .await
            .unwrap();
        assert!(services.task_manager.get(&id).is_some());
    }
}
