//! `mediaflow-server` — the thin HTTP/WebSocket process.
//!
//! Startup order: load configuration, install tracing, open the
//! persistence store, wire the service graph, build the router, serve
//! with graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};

use mediaflow_orchestration::api::{build_router, AppState};
use mediaflow_orchestration::persistence::SqliteTaskStore;
use mediaflow_orchestration::service_registry::register_all_services;
use mediaflow_shared::config::MediaflowConfig;
use mediaflow_shared::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = MediaflowConfig::load()?;
    info!(version = env!("CARGO_PKG_VERSION"), "mediaflow-server starting");

    let store = Arc::new(SqliteTaskStore::connect(&config.database.path).await?);
    info!(database_path = %config.database.path, "persistence store ready");

    let services = register_all_services(store).await?;
    info!(
        workers = config.execution.max_concurrent_workers,
        "service graph wired"
    );

    let state = AppState::new(
        services.task_manager,
        services.notifier,
        services.pipeline_runner,
        services.handlers,
    );
    let app = build_router(state);

    let addr: SocketAddr = config.server.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("mediaflow-server stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install CTRL+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received; starting graceful shutdown");
}
