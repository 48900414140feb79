//! Drill model: the classified, browsable training unit produced by tagging

use super::classification::{Category, ClassificationResult, GarComponent, SkillLevel, Sport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Drill lifecycle status
///
/// The tagging stage only ever creates drills in `Draft`; promotion to
/// review and publication happens in downstream approval workflows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DrillStatus {
    Draft,
    PendingReview,
    Published,
}

impl DrillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrillStatus::Draft => "draft",
            DrillStatus::PendingReview => "pending_review",
            DrillStatus::Published => "published",
        }
    }

    pub fn parse(raw: &str) -> Option<DrillStatus> {
        match raw {
            "draft" => Some(DrillStatus::Draft),
            "pending_review" => Some(DrillStatus::PendingReview),
            "published" => Some(DrillStatus::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for DrillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One instruction step of a drill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstructionStep {
    /// 1-based step number
    pub step_number: u32,
    pub text: String,
    pub duration_seconds: u32,
}

/// A classified training unit derived from exactly one media asset
#[derive(Debug, Clone)]
pub struct Drill {
    pub id: Uuid,
    /// The originating media asset (video/source)
    pub media_asset_id: Uuid,
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub sport: Sport,
    pub category: Category,
    pub skill_level: SkillLevel,
    pub position: Option<String>,
    pub gar_component: Option<GarComponent>,
    pub equipment: Vec<String>,
    pub ai_tags: Vec<String>,
    pub ai_confidence: f64,
    pub status: DrillStatus,
    pub instruction_steps: Vec<InstructionStep>,
    pub created_at: DateTime<Utc>,
}

impl Drill {
    /// Create a new draft drill from a classification result
    pub fn draft(
        media_asset_id: Uuid,
        title: String,
        description: String,
        short_description: String,
        instruction_steps: Vec<InstructionStep>,
        classification: &ClassificationResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            media_asset_id,
            title,
            description,
            short_description,
            sport: classification.sport,
            category: classification.category,
            skill_level: classification.skill_level,
            position: classification.position.clone(),
            gar_component: classification.gar_component,
            equipment: classification.equipment.clone(),
            ai_tags: classification.ai_tags.clone(),
            ai_confidence: ClassificationResult::clamp_confidence(classification.confidence),
            status: DrillStatus::Draft,
            instruction_steps,
            created_at: Utc::now(),
        }
    }
}
