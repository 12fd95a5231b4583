//! Triage Server
//!
//! HTTP surface for the document triage pipeline.
//!
//! Routes:
//! - `POST /process`: raw document body, `source` and `filename` query
//! - `POST /process_api`: `{source, input_data}` JSON envelope
//! - `GET /context/:thread_id`: full processing context
//! - `GET /contexts?limit=`: bounded listing
//! - `GET /health`: store reachability
//! - `GET /`: service description

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod handlers;

use config::{ConfigError, ServerConfig};
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use triage_pipeline::Pipeline;
use triage_store::{ContextStore, ExpirySweeper};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The language capability could not be built
    #[error("Capability error: {0}")]
    Capability(#[from] triage_llm::LlmError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start the HTTP server
///
/// Connects the store (falling back to the in-process backend when the
/// primary cannot be reached), builds the capability and pipeline, starts
/// the expiry sweeper, and serves until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    info!("Starting triage server");
    info!("Bind address: {}", config.bind_addr());
    info!("Store TTL: {} seconds", config.store.ttl_secs);
    info!("Max input size: {} bytes", config.pipeline.max_input_bytes);

    let store = Arc::new(ContextStore::connect(&config.store).await);
    if store.is_degraded() {
        warn!("Serving from the in-process store; contexts will not survive a restart");
    }

    let capability = config.capability.build()?;
    info!("Language capability: {}", capability.name());

    let pipeline = Arc::new(Pipeline::new(
        Arc::clone(&store),
        capability,
        config.pipeline.clone(),
    ));

    let mut sweeper = ExpirySweeper::new(config.store.sweep_interval());
    let sweeper_store = Arc::clone(&store);
    tokio::spawn(async move {
        sweeper.run(sweeper_store).await;
    });

    let app = create_router(AppState { pipeline });

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Triage server listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Triage server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
