//! Pipeline stage tracker
//!
//! Observability bookkeeping for stage attempts. The write side is
//! explicitly best-effort: every method catches and logs its own database
//! errors and returns normally, so tracker failures can never fail a
//! pipeline stage or alter its success/failure path. The tracker never
//! influences control flow or retries.

use crate::db::pipeline_stages::{self, StageRecord, StageStatus};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct StageTracker {
    db: SqlitePool,
}

impl StageTracker {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record the start of a stage attempt
    ///
    /// Returns the attempt id, or `None` if recording failed; the caller
    /// continues either way.
    pub async fn begin(&self, media_asset_id: Uuid, stage: &str) -> Option<i64> {
        match pipeline_stages::insert_attempt(&self.db, media_asset_id, stage, Utc::now()).await {
            Ok(attempt_id) => Some(attempt_id),
            Err(e) => {
                tracing::warn!(
                    media_asset_id = %media_asset_id,
                    stage = stage,
                    error = %e,
                    "Failed to record stage start (continuing)"
                );
                None
            }
        }
    }

    /// Record successful completion of an attempt
    pub async fn complete(
        &self,
        attempt_id: Option<i64>,
        processing_time_ms: i64,
        metadata: serde_json::Value,
    ) {
        let Some(attempt_id) = attempt_id else {
            return;
        };
        if let Err(e) = pipeline_stages::finalize_attempt(
            &self.db,
            attempt_id,
            StageStatus::Completed,
            processing_time_ms,
            Some(&metadata),
            None,
        )
        .await
        {
            tracing::warn!(
                attempt_id = attempt_id,
                error = %e,
                "Failed to record stage completion (continuing)"
            );
        }
    }

    /// Record failure of an attempt
    pub async fn fail(&self, attempt_id: Option<i64>, processing_time_ms: i64, error: &str) {
        let Some(attempt_id) = attempt_id else {
            return;
        };
        if let Err(e) = pipeline_stages::finalize_attempt(
            &self.db,
            attempt_id,
            StageStatus::Failed,
            processing_time_ms,
            None,
            Some(error),
        )
        .await
        {
            tracing::warn!(
                attempt_id = attempt_id,
                error = %e,
                "Failed to record stage failure (continuing)"
            );
        }
    }

    /// Ordered audit trail of attempts for a media asset
    pub async fn attempts_for(&self, media_asset_id: Uuid) -> Result<Vec<StageRecord>> {
        pipeline_stages::load_attempts(&self.db, media_asset_id).await
    }
}
