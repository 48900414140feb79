//! Classification domain enums and the classification result
//!
//! External text (LLM output, filenames) is normalized and parsed into
//! closed enums at the boundary. Unrecognized sport/category values map to
//! an explicit `Unknown` variant rather than silently defaulting.

use serde::{Deserialize, Serialize};

/// Normalize an external label: trim, lowercase, collapse whitespace and
/// hyphens to underscores
pub fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Sports recognized by the platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    Football,
    Basketball,
    Soccer,
    SkiJumping,
    FlagFootball,
    /// Boundary value for unrecognized external text
    Unknown,
}

impl Sport {
    /// Closed-world choices offered to the classifier (excludes Unknown)
    pub const CHOICES: [Sport; 5] = [
        Sport::Football,
        Sport::Basketball,
        Sport::Soccer,
        Sport::SkiJumping,
        Sport::FlagFootball,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Basketball => "basketball",
            Sport::Soccer => "soccer",
            Sport::SkiJumping => "ski_jumping",
            Sport::FlagFootball => "flag_football",
            Sport::Unknown => "unknown",
        }
    }

    /// Parse normalized external text; unrecognized values become `Unknown`
    pub fn parse(raw: &str) -> Sport {
        match normalize_label(raw).as_str() {
            "football" => Sport::Football,
            "basketball" => Sport::Basketball,
            "soccer" => Sport::Soccer,
            "ski_jumping" => Sport::SkiJumping,
            "flag_football" => Sport::FlagFootball,
            _ => Sport::Unknown,
        }
    }
}

impl std::fmt::Display for Sport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drill categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Strength,
    Speed,
    Agility,
    Skill,
    Technique,
    Conditioning,
    /// Boundary value for unrecognized external text
    Unknown,
}

impl Category {
    /// Closed-world choices offered to the classifier (excludes Unknown)
    pub const CHOICES: [Category; 6] = [
        Category::Strength,
        Category::Speed,
        Category::Agility,
        Category::Skill,
        Category::Technique,
        Category::Conditioning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Strength => "strength",
            Category::Speed => "speed",
            Category::Agility => "agility",
            Category::Skill => "skill",
            Category::Technique => "technique",
            Category::Conditioning => "conditioning",
            Category::Unknown => "unknown",
        }
    }

    /// Parse normalized external text; unrecognized values become `Unknown`
    pub fn parse(raw: &str) -> Category {
        match normalize_label(raw).as_str() {
            "strength" => Category::Strength,
            "speed" => Category::Speed,
            "agility" => Category::Agility,
            "skill" => Category::Skill,
            "technique" => Category::Technique,
            "conditioning" => Category::Conditioning,
            _ => Category::Unknown,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Skill levels, ordered beginner → elite
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Elite,
}

impl SkillLevel {
    pub const CHOICES: [SkillLevel; 4] = [
        SkillLevel::Beginner,
        SkillLevel::Intermediate,
        SkillLevel::Advanced,
        SkillLevel::Elite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "beginner",
            SkillLevel::Intermediate => "intermediate",
            SkillLevel::Advanced => "advanced",
            SkillLevel::Elite => "elite",
        }
    }

    /// Parse normalized external text
    ///
    /// The enum is ordered and used for progression filtering, so it has
    /// no Unknown variant; unrecognized values clamp to `Beginner`.
    pub fn parse(raw: &str) -> SkillLevel {
        match normalize_label(raw).as_str() {
            "beginner" => SkillLevel::Beginner,
            "intermediate" => SkillLevel::Intermediate,
            "advanced" => SkillLevel::Advanced,
            "elite" => SkillLevel::Elite,
            _ => SkillLevel::Beginner,
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// GAR (growth athletic rating) components
///
/// This pipeline only attaches the tag; rating computation lives elsewhere.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GarComponent {
    Sprint,
    ChangeOfDirection,
    Vertical,
    Strength,
    Endurance,
}

impl GarComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            GarComponent::Sprint => "sprint",
            GarComponent::ChangeOfDirection => "change_of_direction",
            GarComponent::Vertical => "vertical",
            GarComponent::Strength => "strength",
            GarComponent::Endurance => "endurance",
        }
    }

    /// Parse normalized external text; unrecognized values are dropped
    pub fn parse(raw: &str) -> Option<GarComponent> {
        match normalize_label(raw).as_str() {
            "sprint" => Some(GarComponent::Sprint),
            "change_of_direction" => Some(GarComponent::ChangeOfDirection),
            "vertical" => Some(GarComponent::Vertical),
            "strength" => Some(GarComponent::Strength),
            "endurance" => Some(GarComponent::Endurance),
            _ => None,
        }
    }
}

impl std::fmt::Display for GarComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured output of classifying one media asset
///
/// Computed once per tagging attempt and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassificationResult {
    pub sport: Sport,
    pub category: Category,
    pub skill_level: SkillLevel,
    /// Detected equipment, order as detected
    pub equipment: Vec<String>,
    pub gar_component: Option<GarComponent>,
    pub position: Option<String>,
    /// Small ordered list of free-text descriptive tags
    pub ai_tags: Vec<String>,
    /// Always within [0.0, 1.0]
    pub confidence: f64,
    pub reasoning: String,
}

impl ClassificationResult {
    /// Clamp confidence into [0.0, 1.0] (NaN becomes 0.0)
    pub fn clamp_confidence(value: f64) -> f64 {
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}
