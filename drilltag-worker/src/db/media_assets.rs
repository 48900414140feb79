//! Media asset persistence
//!
//! The processing log is an append-only JSON array column. Appends use a
//! single `json_insert` UPDATE so concurrent duplicate deliveries cannot
//! lose entries.

use crate::models::{MediaAsset, ProcessingLogEntry};
use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Insert a media asset (used by the upload stage and tests)
pub async fn insert_media_asset(pool: &SqlitePool, asset: &MediaAsset) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO media_assets (id, file_name, file_type, processing_log)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(asset.id.to_string())
    .bind(&asset.file_name)
    .bind(&asset.file_type)
    .bind(serde_json::to_string(&asset.processing_log)?)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a media asset by id
pub async fn load_media_asset(pool: &SqlitePool, id: Uuid) -> Result<Option<MediaAsset>> {
    let row = sqlx::query(
        r#"
        SELECT id, file_name, file_type, processing_log
        FROM media_assets
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let id_str: String = row.get("id");
            let log_json: String = row.get("processing_log");
            let processing_log: Vec<ProcessingLogEntry> = serde_json::from_str(&log_json)?;

            Ok(Some(MediaAsset {
                id: Uuid::parse_str(&id_str)?,
                file_name: row.get("file_name"),
                file_type: row.get("file_type"),
                processing_log,
            }))
        }
        None => Ok(None),
    }
}

/// Atomically append one entry to a media asset's processing log
///
/// Prior entries are never rewritten; the append happens in a single
/// UPDATE statement.
pub async fn append_processing_log(
    pool: &SqlitePool,
    id: Uuid,
    entry: &ProcessingLogEntry,
) -> Result<()> {
    let entry_json = serde_json::to_string(entry)?;

    let result = sqlx::query(
        r#"
        UPDATE media_assets
        SET processing_log = json_insert(processing_log, '$[#]', json(?))
        WHERE id = ?
        "#,
    )
    .bind(entry_json)
    .bind(id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        bail!("media asset {} not found for processing log append", id);
    }

    Ok(())
}
