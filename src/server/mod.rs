//! Web prediction service
//!
//! The pipeline is loaded once before the listener starts and shared
//! read-only across requests.

pub mod form;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::pipeline::{ChurnModel, ChurnPipeline};
use handlers::{health, index, predict_form, predict_json};

pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Shared, immutable service state
#[derive(Debug)]
pub struct AppState {
    pub pipeline: ChurnPipeline,
}

impl AppState {
    pub fn new(pipeline: ChurnPipeline) -> Arc<Self> {
        Arc::new(Self { pipeline })
    }
}

/// Build the axum [`Router`] with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn run_server(pipeline: ChurnPipeline, addr: &str) -> Result<()> {
    info!(algorithm = pipeline.algorithm_name(), "Loaded churn model");
    let app = build_router(AppState::new(pipeline));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Prediction service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
    }
}
