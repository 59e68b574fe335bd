use std::sync::Arc;

use anyhow::{Context, Result};
use axum::serve;
use tokio::net::TcpListener;
use tracing::info;
use wai_core::{InMemoryMessageStore, ReqwestGraphApi};

use crate::config::IntakeConfig;
use crate::http::{AppState, build_router};

/// Starts the intake HTTP server and runs until Ctrl+C or SIGTERM.
pub async fn run(config: IntakeConfig) -> Result<()> {
    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let graph = ReqwestGraphApi::new(client, Some(&config.api_base))?;
    if config.verify_token.is_none() {
        tracing::warn!("WHATSAPP_VERIFY_TOKEN is not set; webhook verification will fail");
    }

    let state = AppState::new(
        Arc::new(InMemoryMessageStore::new()),
        Arc::new(graph),
        config.verify_token.clone(),
    );
    let router = build_router(state);
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!(api_base = %config.api_base, "wai-intake listening on {}", config.addr);

    serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("wai-intake stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
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
    info!("shutdown signal received");
}
