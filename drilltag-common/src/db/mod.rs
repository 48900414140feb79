//! Shared SQLite database access
//!
//! All pipeline workers share one database. Table creation is idempotent
//! and runs at every startup.

use crate::Result;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Creates the parent directory if missing and connects with the file
/// created on demand. Foreign key enforcement is part of the connect
/// options so every pooled connection gets it.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!("Connecting to database: {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the pipeline tables if they don't exist
///
/// `media_assets.processing_log` and the JSON columns on `drills` and
/// `pipeline_stages` hold serialized JSON (TEXT affinity).
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // Ad-hoc pools (tests) reach init_tables without the connect options
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media_assets (
            id TEXT PRIMARY KEY,
            file_name TEXT NOT NULL,
            file_type TEXT NOT NULL,
            processing_log TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS drills (
            id TEXT PRIMARY KEY,
            media_asset_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            short_description TEXT NOT NULL DEFAULT '',
            sport TEXT NOT NULL,
            category TEXT NOT NULL,
            skill_level TEXT NOT NULL,
            position TEXT,
            gar_component TEXT,
            equipment TEXT NOT NULL DEFAULT '[]',
            ai_tags TEXT NOT NULL DEFAULT '[]',
            ai_confidence REAL NOT NULL DEFAULT 0.0,
            status TEXT NOT NULL DEFAULT 'draft',
            instruction_steps TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            FOREIGN KEY (media_asset_id) REFERENCES media_assets(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per (media_asset_id, stage) attempt; retries append new rows
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_stages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            media_asset_id TEXT NOT NULL,
            stage TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            processing_time_ms INTEGER,
            metadata TEXT,
            error TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_pipeline_stages_asset
         ON pipeline_stages(media_asset_id, stage)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
