//! Drill persistence

use crate::models::{Category, Drill, DrillStatus, InstructionStep, SkillLevel, Sport};
use crate::models::GarComponent;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Save a new drill
pub async fn save_drill(pool: &SqlitePool, drill: &Drill) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO drills (
            id, media_asset_id, title, description, short_description,
            sport, category, skill_level, position, gar_component,
            equipment, ai_tags, ai_confidence, status, instruction_steps,
            created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(drill.id.to_string())
    .bind(drill.media_asset_id.to_string())
    .bind(&drill.title)
    .bind(&drill.description)
    .bind(&drill.short_description)
    .bind(drill.sport.as_str())
    .bind(drill.category.as_str())
    .bind(drill.skill_level.as_str())
    .bind(&drill.position)
    .bind(drill.gar_component.map(|g| g.as_str()))
    .bind(serde_json::to_string(&drill.equipment)?)
    .bind(serde_json::to_string(&drill.ai_tags)?)
    .bind(drill.ai_confidence)
    .bind(drill.status.as_str())
    .bind(serde_json::to_string(&drill.instruction_steps)?)
    .bind(drill.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a drill by id
pub async fn load_drill(pool: &SqlitePool, id: Uuid) -> Result<Option<Drill>> {
    let row = sqlx::query(
        r#"
        SELECT id, media_asset_id, title, description, short_description,
               sport, category, skill_level, position, gar_component,
               equipment, ai_tags, ai_confidence, status, instruction_steps,
               created_at
        FROM drills
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(drill_from_row).transpose()
}

/// Count drills created from one media asset
pub async fn count_drills_for_asset(pool: &SqlitePool, media_asset_id: Uuid) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) AS n FROM drills WHERE media_asset_id = ?")
        .bind(media_asset_id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(row.get("n"))
}

fn drill_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Drill> {
    let id_str: String = row.get("id");
    let asset_str: String = row.get("media_asset_id");
    let status_str: String = row.get("status");
    let created_str: String = row.get("created_at");

    let equipment: Vec<String> = serde_json::from_str(row.get("equipment"))?;
    let ai_tags: Vec<String> = serde_json::from_str(row.get("ai_tags"))?;
    let instruction_steps: Vec<InstructionStep> =
        serde_json::from_str(row.get("instruction_steps"))?;

    let gar_component: Option<String> = row.get("gar_component");

    Ok(Drill {
        id: Uuid::parse_str(&id_str)?,
        media_asset_id: Uuid::parse_str(&asset_str)?,
        title: row.get("title"),
        description: row.get("description"),
        short_description: row.get("short_description"),
        sport: Sport::parse(row.get("sport")),
        category: Category::parse(row.get("category")),
        skill_level: SkillLevel::parse(row.get("skill_level")),
        position: row.get("position"),
        gar_component: gar_component.as_deref().and_then(GarComponent::parse),
        equipment,
        ai_tags,
        ai_confidence: row.get("ai_confidence"),
        status: DrillStatus::parse(&status_str)
            .ok_or_else(|| anyhow!("unknown drill status: {}", status_str))?,
        instruction_steps,
        created_at: DateTime::parse_from_rfc3339(&created_str)?.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::media_assets;
    use crate::models::{ClassificationResult, MediaAsset};

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        drilltag_common::db::init_tables(&pool).await.unwrap();
        pool
    }

    async fn insert_asset(pool: &SqlitePool) -> Uuid {
        let asset = MediaAsset {
            id: Uuid::new_v4(),
            file_name: "drill.mp4".to_string(),
            file_type: "video/mp4".to_string(),
            processing_log: vec![],
        };
        media_assets::insert_media_asset(pool, &asset).await.unwrap();
        asset.id
    }

    fn sample_drill(media_asset_id: Uuid) -> Drill {
        let classification = ClassificationResult {
            sport: Sport::Soccer,
            category: Category::Technique,
            skill_level: SkillLevel::Intermediate,
            equipment: vec!["cones".to_string(), "ball".to_string()],
            gar_component: Some(GarComponent::ChangeOfDirection),
            position: Some("midfielder".to_string()),
            ai_tags: vec!["passing".to_string(), "first touch".to_string()],
            confidence: 0.87,
            reasoning: "passing work".to_string(),
        };
        Drill::draft(
            media_asset_id,
            "Passing Triangle".to_string(),
            "Set up a triangle of cones".to_string(),
            "Triangle passing".to_string(),
            vec![InstructionStep {
                step_number: 1,
                text: "Set up a triangle of cones".to_string(),
                duration_seconds: 30,
            }],
            &classification,
        )
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let pool = test_pool().await;
        let drill = sample_drill(insert_asset(&pool).await);
        save_drill(&pool, &drill).await.unwrap();

        let loaded = load_drill(&pool, drill.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, drill.id);
        assert_eq!(loaded.media_asset_id, drill.media_asset_id);
        assert_eq!(loaded.title, "Passing Triangle");
        assert_eq!(loaded.sport, Sport::Soccer);
        assert_eq!(loaded.status, DrillStatus::Draft);
        assert_eq!(loaded.gar_component, Some(GarComponent::ChangeOfDirection));
        assert_eq!(loaded.equipment, drill.equipment);
        assert_eq!(loaded.instruction_steps, drill.instruction_steps);
        assert_eq!(loaded.ai_confidence, 0.87);
    }

    #[tokio::test]
    async fn test_count_drills_for_asset() {
        let pool = test_pool().await;
        let asset = insert_asset(&pool).await;
        let other = insert_asset(&pool).await;

        assert_eq!(count_drills_for_asset(&pool, asset).await.unwrap(), 0);
        save_drill(&pool, &sample_drill(asset)).await.unwrap();
        save_drill(&pool, &sample_drill(asset)).await.unwrap();
        save_drill(&pool, &sample_drill(other)).await.unwrap();

        assert_eq!(count_drills_for_asset(&pool, asset).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let pool = test_pool().await;
        assert!(load_drill(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_unknown_media_asset() {
        let pool = test_pool().await;
        let result = save_drill(&pool, &sample_drill(Uuid::new_v4())).await;
        assert!(result.is_err(), "drills must reference an existing media asset");
    }
}
