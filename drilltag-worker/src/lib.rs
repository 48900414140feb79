//! drilltag-worker library interface
//!
//! Exposes the tagging pipeline pieces for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::{TaggingError, TaggingResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

use drilltag_common::EventBus;
use services::OllamaClient;

/// Application state shared by the worker and its HTTP surface
#[derive(Clone)]
pub struct AppState {
    /// Shared database connection pool
    pub db: SqlitePool,
    /// Pipeline event bus (injectable; tests construct their own)
    pub event_bus: EventBus,
    /// Classification client for the inference endpoint
    pub classifier: Arc<OllamaClient>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last handler error for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, classifier: Arc<OllamaClient>) -> Self {
        Self {
            db,
            event_bus,
            classifier,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// Build the worker's HTTP router
pub fn build_router(state: AppState) -> Router {
    Router::new().merge(api::health_routes()).with_state(state)
}
