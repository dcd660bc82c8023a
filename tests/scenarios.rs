//! End-to-end scenarios against the assembled service graph, driven
//! through `mediaflow_orchestration::service_registry::register_all_services`
//! exactly as `mediaflow-server` assembles it, but with the bundled
//! stub collaborators standing in for real media tooling.

use std::sync::Arc;

use mediaflow_orchestration::notifier::ConnectionId;
use mediaflow_orchestration::persistence::{InMemoryTaskStore, SqliteTaskStore};
use mediaflow_orchestration::pipeline::PipelineStepRequest;
use mediaflow_orchestration::service_registry::register_all_services;
use mediaflow_orchestration::task_manager::TaskManager;
use mediaflow_shared::TaskStatus;

fn download_step(url: &str) -> PipelineStepRequest {
    PipelineStepRequest {
        step_name: "download".to_string(),
        params: serde_json::json!({"url": url, "destination_dir": "/work"}),
    }
}

/// Submit a pipeline, let it run to completion, and inspect the derived
/// result files.
#[tokio::test]
async fn create_run_complete() -> anyhow::Result<()> {
    let services = register_all_services(Arc::new(InMemoryTaskStore::new())).await?;

    let steps = vec![
        download_step("https://example.com/watch/clip-one"),
        PipelineStepRequest {
            step_name: "transcribe".to_string(),
            params: serde_json::json!({}),
        },
    ];
    let params = serde_json::json!({"steps": steps});
    let id = services
        .task_manager
        .create("pipeline", None, None, Some(params))
        .await?;

    services
        .pipeline_runner
        .run(&services.task_manager, &id, steps)
        .await?;

    let task = services.task_manager.get(&id).expect("task still present");
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.progress, 100.0);
    let result = task.result.expect("completed task carries a result");
    assert!(result.files.iter().any(|f| f.file_type == "video"));
    Ok(())
}

/// A second submission with the same download URL while the first run
/// is still active is treated as the same task rather than starting a
/// new one.
#[tokio::test]
async fn dedupe_debounces_a_second_identical_submission() -> anyhow::Result<()> {
    let task_manager = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
    let params = serde_json::json!({"url": "https://example.com/watch/same-clip"});

    let first_id = task_manager
        .create("download", None, None, Some(params.clone()))
        .await?;

    let existing = task_manager
        .find_task_by_params("download", &params)
        .expect("dedupe probe finds the active task");
    assert_eq!(existing, first_id);

    let task = task_manager.get(&existing).unwrap();
    assert!(task.status.is_active());
    Ok(())
}

/// Once a task lands on a terminal status, the same submission recycles
/// it in place (reset to pending) instead of creating a new one.
#[tokio::test]
async fn recycle_resets_a_terminal_task_on_resubmission() -> anyhow::Result<()> {
    let task_manager = Arc::new(TaskManager::new(Arc::new(InMemoryTaskStore::new())));
    let params = serde_json::json!({"url": "https://example.com/watch/same-clip"});

    let id = task_manager
        .create("download", None, None, Some(params.clone()))
        .await?;
    task_manager
        .update(
            &id,
            mediaflow_orchestration::task_manager::TaskUpdate::default()
                .status(TaskStatus::Completed)
                .progress(100.0),
        )
        .await?;

    let existing = task_manager
        .find_task_by_params("download", &params)
        .expect("dedupe probe still matches the terminal task by params");
    assert_eq!(existing, id);

    task_manager.reset(&existing).await?;
    let task = task_manager.get(&existing).unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.progress, 0.0);
    Ok(())
}

/// Cancelling mid-pipeline stops before the next step runs and the task
/// lands on `cancelled`, never `failed`.
#[tokio::test]
async fn cooperative_cancel_stops_a_running_pipeline() -> anyhow::Result<()> {
    let services = register_all_services(Arc::new(InMemoryTaskStore::new())).await?;

    let steps = vec![
        download_step("https://example.com/watch/long-clip"),
        PipelineStepRequest {
            step_name: "transcribe".to_string(),
            params: serde_json::json!({}),
        },
    ];
    let id = services
        .task_manager
        .create("pipeline", None, None, None)
        .await?;

    let task_manager = services.task_manager.clone();
    let runner = services.pipeline_runner.clone();
    let run_task_id = id.clone();
    let run_steps = steps.clone();
    let handle = tokio::spawn(async move { runner.run(&task_manager, &run_task_id, run_steps).await });

    // The stub transcribe step sleeps 10ms before checking cancellation;
    // cancel while it is still in flight.
    tokio::time::sleep(std::time::Duration::from_millis(3)).await;
    services.task_manager.cancel(&id).await?;

    let outcome = handle.await?;
    assert!(outcome.is_err());
    let task = services.task_manager.get(&id).unwrap();
    assert_eq!(task.status, TaskStatus::Cancelled);
    Ok(())
}

/// A task left `running` when the process stops is recovered to
/// `paused` (with `cancelled` set) on the next `TaskManager::init`,
/// backed by a real SQLite file rather than the in-memory store.
#[tokio::test]
async fn restart_recovery_marks_stale_running_tasks_paused() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("mediaflow.db");
    let db_path = db_path.to_str().unwrap().to_string();

    {
        let store = SqliteTaskStore::connect(&db_path).await?;
        let task_manager = TaskManager::new(Arc::new(store));
        task_manager.init().await?;
        let id = task_manager
            .create("transcribe", None, None, Some(serde_json::json!({"video_path": "/a.mp4"})))
            .await?;
        task_manager
            .update(
                &id,
                mediaflow_orchestration::task_manager::TaskUpdate::default().status(TaskStatus::Running),
            )
            .await?;
        // Process "crashes" here: no further writes, store dropped.
    }

    let store = SqliteTaskStore::connect(&db_path).await?;
    let recovered_manager = TaskManager::new(Arc::new(store));
    recovered_manager.init().await?;

    let tasks = recovered_manager.list();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, TaskStatus::Paused);
    assert!(tasks[0].cancelled);
    Ok(())
}

/// A newly connecting observer sees the current snapshot size reflected
/// in the Task Manager, and disconnecting is reflected in the
/// Notifier's live connection count.
#[tokio::test]
async fn observer_connection_bookkeeping_tracks_connect_and_disconnect() -> anyhow::Result<()> {
    let services = register_all_services(Arc::new(InMemoryTaskStore::new())).await?;
    services
        .task_manager
        .create("pipeline", None, None, None)
        .await?;

    assert_eq!(services.notifier.connection_count(), 0);

    let connection_id = ConnectionId::new();
    // `Notifier::connect` takes the split sink half of a live
    // `axum::extract::ws::WebSocket`, which only exists behind a real
    // HTTP upgrade; bookkeeping methods that don't touch the socket are
    // still directly exercisable here.
    services.notifier.disconnect(connection_id);
    assert_eq!(services.notifier.connection_count(), 0);

    let snapshot = services.task_manager.snapshot();
    assert_eq!(snapshot.len(), 1);
    Ok(())
}
