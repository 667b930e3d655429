//! Application builder and server bootstrap.

use axum::Router;
use tower_http::trace::TraceLayer;

use imgshift_convert::Backends;
use imgshift_convert::tools::{ToolRunner, ToolStatus, probe_tools};
use imgshift_core::config::{AppConfig, ToolsConfig};
use imgshift_core::error::AppError;
use imgshift_core::result::AppResult;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Probe every configured external tool.
///
/// Missing tools are logged. When `require_all` is set, any missing tool is
/// a configuration error.
pub fn check_tools(tools: &ToolsConfig) -> AppResult<Vec<ToolStatus>> {
    let report = probe_tools(tools, &ToolRunner::new());

    for status in &report {
        if status.available {
            tracing::debug!(tool = status.name, command = %status.command, "Tool available");
        } else {
            tracing::warn!(tool = status.name, command = %status.command, "Tool not found");
        }
    }

    let missing: Vec<_> = report
        .iter()
        .filter(|s| !s.available)
        .map(|s| s.command.as_str())
        .collect();

    if tools.require_all && !missing.is_empty() {
        return Err(AppError::configuration(format!(
            "Missing external tools: {}",
            missing.join(", ")
        )));
    }

    Ok(report)
}

/// Runs the imgshift server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting imgshift server...");

    check_tools(&config.tools)?;

    let temp_root = config.conversion.effective_temp_root();
    tokio::fs::create_dir_all(&temp_root).await.map_err(|e| {
        AppError::configuration(format!(
            "Failed to create temp root '{}': {e}",
            temp_root.display()
        ))
    })?;

    let backends = Backends::standard(&config.conversion, &config.tools);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = build_app(AppState::new(config, backends));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(temp_root = %temp_root.display(), "imgshift listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}
