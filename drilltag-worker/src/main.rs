//! drilltag-worker - AI Tagging Worker
//!
//! Background worker of the media-ingestion pipeline: consumes
//! `MediaTranscribed` events, classifies each transcript into a draft
//! drill (LLM with keyword fallback), and emits `DrillTagged` for the
//! embedding stage. No interactive arguments; configuration comes from
//! TOML + environment, behavior from events.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use drilltag_common::{Config, EventBus};
use drilltag_worker::services::OllamaClient;
use drilltag_worker::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting drilltag-worker (AI Tagging)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;

    let db_path = config.resolve_database_path();
    info!("Database: {}", db_path.display());
    let db_pool = drilltag_common::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    let event_bus = EventBus::new(config.event_capacity);
    info!("Event bus initialized (capacity {})", config.event_capacity);

    let classifier = Arc::new(OllamaClient::new(config.ollama.clone())?);

    // Assert the inference backend is reachable; the worker still starts
    // on failure and relies on the keyword fallback
    match classifier.health_check().await {
        Ok(models) => info!(
            endpoint = %config.ollama.endpoint,
            models = models.len(),
            "Inference backend reachable"
        ),
        Err(e) => warn!(
            endpoint = %config.ollama.endpoint,
            error = %e,
            "Inference backend unreachable; classifications will use keyword fallback"
        ),
    }

    let state = AppState::new(db_pool, event_bus, classifier);

    tokio::spawn(drilltag_worker::workflow::run_tagging_worker(state.clone()));
    info!("Tagging worker started");

    let app = drilltag_worker::build_router(state);
    let listener =
        tokio::net::TcpListener::bind(("127.0.0.1", config.http_port)).await?;
    info!("Listening on http://127.0.0.1:{}", config.http_port);
    info!("Health check: http://127.0.0.1:{}/health", config.http_port);

    axum::serve(listener, app).await?;

    Ok(())
}
