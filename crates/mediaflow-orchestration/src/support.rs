//! Bridges a collaborator's synchronous progress callback and
//! cancellation probe onto the async Task Manager.
//!
//! The original posts a closure onto the event loop via
//! `asyncio.run_coroutine_threadsafe`; here, the callback fires a
//! detached `tokio::spawn` so a collaborator (including one running on
//! a blocking thread via `spawn_blocking`) never has to await anything.
//! Shared by the bundled pipeline Steps and the Background Task Runner
//! — both bridge the same collaborator interface (§6.3) the same way.

use crate::task_manager::{TaskManager, TaskUpdate};
use mediaflow_worker::{CancellationProbe, ProgressCallback};
use std::sync::Arc;

pub fn progress_callback(task_manager: Arc<TaskManager>, task_id: Option<&str>) -> ProgressCallback {
    let task_id = task_id.map(str::to_string);
    Arc::new(move |percent, message| {
        let Some(task_id) = task_id.clone() else {
            return;
        };
        let task_manager = task_manager.clone();
        let message = message.to_string();
        tokio::spawn(async move {
            let _ = task_manager
                .update(&task_id, TaskUpdate::default().progress(percent).message(message))
                .await;
        });
    })
}

pub fn cancellation_probe(task_manager: Arc<TaskManager>, task_id: Option<&str>) -> CancellationProbe {
    let task_id = task_id.map(str::to_string);
    Arc::new(move || {
        task_id
            .as_deref()
            .map(|id| task_manager.is_cancelled(id))
            .unwrap_or(false)
    })
}
