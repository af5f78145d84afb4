//! Application builder — wires router + middleware + state into an Axum app,
//! and runs it alongside the visitor reclaimer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;

use taskgo_core::config::AppConfig;
use taskgo_core::error::AppError;
use taskgo_core::result::AppResult;
use taskgo_limiter::{Reclaimer, VisitorRegistry};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the TaskGo server until Ctrl-C / SIGTERM.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting TaskGo server...");

    // ── Step 1: Admission control ────────────────────────────────
    config.rate_limit.validate()?;
    let visitors = Arc::new(VisitorRegistry::from_config(&config.rate_limit)?);
    tracing::info!(
        requests_per_second = config.rate_limit.requests_per_second,
        burst = config.rate_limit.burst,
        enabled = config.rate_limit.enabled,
        "Rate limiter initialized"
    );

    // ── Step 2: Shutdown channel & reclaimer ─────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reclaimer_handle = if config.rate_limit.enabled {
        let reclaimer = Reclaimer::from_config(Arc::clone(&visitors), &config.rate_limit);
        Some(reclaimer.spawn(shutdown_rx))
    } else {
        None
    };

    // ── Step 3: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let app = build_app(AppState::new(config, visitors));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("TaskGo server listening on {}", addr);

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    })
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)));

    // The sender is gone by now either way, so the reclaimer is exiting.
    if let Some(handle) = reclaimer_handle {
        match tokio::time::timeout(grace, handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Reclaimer task failed"),
            Err(_) => tracing::warn!("Reclaimer did not stop within the grace period"),
        }
    }

    served?;
    tracing::info!("TaskGo server exited gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
