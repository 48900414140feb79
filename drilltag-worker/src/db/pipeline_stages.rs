//! Pipeline stage attempt records
//!
//! One row per (media_asset_id, stage) attempt. An attempt transitions
//! processing → completed or processing → failed exactly once; a retry is
//! a brand-new row, keeping stage history as an audit trail.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Stage attempt status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Processing,
    Completed,
    Failed,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Processing => "processing",
            StageStatus::Completed => "completed",
            StageStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<StageStatus> {
        match raw {
            "processing" => Some(StageStatus::Processing),
            "completed" => Some(StageStatus::Completed),
            "failed" => Some(StageStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded stage attempt
#[derive(Debug, Clone)]
pub struct StageRecord {
    pub id: i64,
    pub media_asset_id: Uuid,
    pub stage: String,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub processing_time_ms: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// Insert a new `processing` attempt row, returning its id
pub async fn insert_attempt(
    pool: &SqlitePool,
    media_asset_id: Uuid,
    stage: &str,
    started_at: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO pipeline_stages (media_asset_id, stage, status, started_at)
        VALUES (?, ?, 'processing', ?)
        "#,
    )
    .bind(media_asset_id.to_string())
    .bind(stage)
    .bind(started_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Finalize an attempt exactly once
///
/// The WHERE guard rejects a second finalization of the same attempt.
pub async fn finalize_attempt(
    pool: &SqlitePool,
    attempt_id: i64,
    status: StageStatus,
    processing_time_ms: i64,
    metadata: Option<&serde_json::Value>,
    error: Option<&str>,
) -> Result<()> {
    if status == StageStatus::Processing {
        bail!("cannot finalize an attempt back to processing");
    }

    let metadata_json = metadata.map(serde_json::Value::to_string);

    let result = sqlx::query(
        r#"
        UPDATE pipeline_stages
        SET status = ?, completed_at = ?, processing_time_ms = ?, metadata = ?, error = ?
        WHERE id = ? AND status = 'processing'
        "#,
    )
    .bind(status.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(processing_time_ms)
    .bind(metadata_json)
    .bind(error)
    .bind(attempt_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        bail!("stage attempt {} already finalized or unknown", attempt_id);
    }

    Ok(())
}

/// Load all attempts for a media asset, oldest first
pub async fn load_attempts(pool: &SqlitePool, media_asset_id: Uuid) -> Result<Vec<StageRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT id, media_asset_id, stage, status, started_at, completed_at,
               processing_time_ms, metadata, error
        FROM pipeline_stages
        WHERE media_asset_id = ?
        ORDER BY id
        "#,
    )
    .bind(media_asset_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let asset_str: String = row.get("media_asset_id");
            let status_str: String = row.get("status");
            let started_str: String = row.get("started_at");
            let completed_str: Option<String> = row.get("completed_at");
            let metadata_str: Option<String> = row.get("metadata");

            Ok(StageRecord {
                id: row.get("id"),
                media_asset_id: Uuid::parse_str(&asset_str)?,
                stage: row.get("stage"),
                status: StageStatus::parse(&status_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown stage status: {}", status_str))?,
                started_at: DateTime::parse_from_rfc3339(&started_str)?.with_timezone(&Utc),
                completed_at: completed_str
                    .map(|s| DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&Utc)))
                    .transpose()?,
                processing_time_ms: row.get("processing_time_ms"),
                metadata: metadata_str
                    .map(|s| serde_json::from_str(&s))
                    .transpose()?,
                error: row.get("error"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        drilltag_common::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_attempt_lifecycle() {
        let pool = test_pool().await;
        let asset = Uuid::new_v4();

        let attempt = insert_attempt(&pool, asset, "tagging", Utc::now())
            .await
            .unwrap();
        let metadata = json!({ "sport": "football", "confidence": 0.5 });
        finalize_attempt(&pool, attempt, StageStatus::Completed, 120, Some(&metadata), None)
            .await
            .unwrap();

        let attempts = load_attempts(&pool, asset).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, StageStatus::Completed);
        assert_eq!(attempts[0].processing_time_ms, Some(120));
        assert_eq!(attempts[0].metadata.as_ref().unwrap()["sport"], "football");
        assert!(attempts[0].completed_at.is_some());
        assert!(attempts[0].error.is_none());
    }

    #[tokio::test]
    async fn test_attempt_finalized_exactly_once() {
        let pool = test_pool().await;
        let attempt = insert_attempt(&pool, Uuid::new_v4(), "tagging", Utc::now())
            .await
            .unwrap();

        finalize_attempt(&pool, attempt, StageStatus::Failed, 50, None, Some("boom"))
            .await
            .unwrap();
        let second = finalize_attempt(&pool, attempt, StageStatus::Completed, 60, None, None).await;
        assert!(second.is_err(), "second finalization must be rejected");
    }

    #[tokio::test]
    async fn test_retries_create_new_rows() {
        let pool = test_pool().await;
        let asset = Uuid::new_v4();

        let first = insert_attempt(&pool, asset, "tagging", Utc::now()).await.unwrap();
        finalize_attempt(&pool, first, StageStatus::Failed, 10, None, Some("db down"))
            .await
            .unwrap();

        let second = insert_attempt(&pool, asset, "tagging", Utc::now()).await.unwrap();
        finalize_attempt(&pool, second, StageStatus::Completed, 20, None, None)
            .await
            .unwrap();

        let attempts = load_attempts(&pool, asset).await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].status, StageStatus::Failed);
        assert_eq!(attempts[0].error.as_deref(), Some("db down"));
        assert_eq!(attempts[1].status, StageStatus::Completed);
    }

    #[tokio::test]
    async fn test_finalize_to_processing_rejected() {
        let pool = test_pool().await;
        let attempt = insert_attempt(&pool, Uuid::new_v4(), "tagging", Utc::now())
            .await
            .unwrap();
        let result =
            finalize_attempt(&pool, attempt, StageStatus::Processing, 0, None, None).await;
        assert!(result.is_err());
    }
}
