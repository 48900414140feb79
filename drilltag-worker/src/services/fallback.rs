//! Deterministic keyword fallback classifier
//!
//! Guarantees the tagging stage always produces a classification when the
//! inference endpoint is unreachable or returns garbage. Pure function of
//! (transcript, filename); no hidden state, no I/O.
//!
//! The fixed 0.5 confidence marks the result as heuristic so downstream
//! consumers can route it to mandatory human review.

use crate::models::{Category, ClassificationResult, GarComponent, SkillLevel, Sport};

/// Fixed confidence signalling "heuristic, not AI"
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Equipment vocabulary; detection order is vocabulary order
const EQUIPMENT_VOCABULARY: &[(&str, &str)] = &[
    ("cones", "cone"),
    ("ball", "ball"),
    ("ladder", "ladder"),
    ("hurdle", "hurdle"),
    ("sled", "sled"),
    ("band", "band"),
    ("medicine ball", "medicine ball"),
    ("parachute", "parachute"),
    ("box", "box"),
    ("rope", "rope"),
    ("net", "net"),
    ("cleats", "cleat"),
];

const SPORT_KEYWORDS: &[(Sport, &[&str])] = &[
    (
        Sport::Football,
        &[
            "football",
            "quarterback",
            "touchdown",
            "receiver",
            "linebacker",
            "snap",
            "blitz",
            "route",
            "scrimmage",
        ],
    ),
    (
        Sport::Basketball,
        &[
            "basketball",
            "dribble",
            "layup",
            "dunk",
            "rebound",
            "jump shot",
            "free throw",
            "basket",
        ],
    ),
    (
        Sport::Soccer,
        &[
            "soccer",
            "goalkeeper",
            "midfielder",
            "striker",
            "header",
            "penalty kick",
            "corner kick",
        ],
    ),
    (
        Sport::SkiJumping,
        &[
            "ski jump",
            "ski jumping",
            "inrun",
            "takeoff ramp",
            "landing hill",
            "telemark",
        ],
    ),
    (
        Sport::FlagFootball,
        &["flag football", "flag pull", "flag belt"],
    ),
];

const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Strength,
        &[
            "strength", "squat", "deadlift", "bench", "barbell", "dumbbell", "weight", "lift",
        ],
    ),
    (
        Category::Speed,
        &["sprint", "dash", "acceleration", "velocity", "speed"],
    ),
    (
        Category::Agility,
        &[
            "agility",
            "ladder",
            "cone",
            "shuffle",
            "weave",
            "change of direction",
            "zigzag",
        ],
    ),
    (
        Category::Skill,
        &[
            "dribble", "dribbling", "catch", "throw", "pass", "shoot", "shooting", "layup",
        ],
    ),
    (
        Category::Technique,
        &["technique", "form", "mechanics", "footwork", "fundamentals"],
    ),
    (
        Category::Conditioning,
        &["conditioning", "endurance", "cardio", "stamina", "circuit"],
    ),
];

/// Classify a transcript + filename pair by keyword matching
///
/// Deterministic: the same input always yields the same result. Sport
/// defaults to football and category to strength when nothing matches.
pub fn classify(transcript: &str, file_name: &str) -> ClassificationResult {
    let haystack = build_haystack(transcript, file_name);

    let sport = detect_sport(&haystack);
    let (category, matched_keywords) = detect_category(&haystack);
    let skill_level = detect_skill_level(&haystack);
    let equipment = detect_equipment(&haystack);
    let gar_component = gar_for_category(category);

    let reasoning = if matched_keywords.is_empty() {
        "keyword fallback: no category keywords matched, using defaults".to_string()
    } else {
        format!(
            "keyword fallback: matched [{}]",
            matched_keywords.join(", ")
        )
    };

    ClassificationResult {
        sport,
        category,
        skill_level,
        equipment,
        gar_component,
        position: None,
        ai_tags: vec![
            category.as_str().to_string(),
            sport.as_str().to_string(),
            "training".to_string(),
        ],
        confidence: FALLBACK_CONFIDENCE,
        reasoning,
    }
}

/// Lowercased search text; filename separators become spaces so
/// `agility_ladder_drill_03.mp4` matches multi-word keywords
fn build_haystack(transcript: &str, file_name: &str) -> String {
    let cleaned_name: String = file_name
        .to_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '-' || c == '.' { ' ' } else { c })
        .collect();
    format!("{} {}", transcript.to_lowercase(), cleaned_name)
}

fn detect_sport(haystack: &str) -> Sport {
    // "flag football" contains "football"; resolve the specific sport first
    if SPORT_KEYWORDS
        .iter()
        .find(|(sport, _)| *sport == Sport::FlagFootball)
        .is_some_and(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
    {
        return Sport::FlagFootball;
    }

    let mut best = Sport::Football;
    let mut best_hits = 0;
    for (sport, keywords) in SPORT_KEYWORDS {
        let hits = keywords.iter().filter(|k| haystack.contains(*k)).count();
        if hits > best_hits {
            best = *sport;
            best_hits = hits;
        }
    }
    best
}

fn detect_category(haystack: &str) -> (Category, Vec<String>) {
    let mut best = Category::Strength;
    let mut best_matches: Vec<String> = Vec::new();
    for (category, keywords) in CATEGORY_KEYWORDS {
        let matches: Vec<String> = keywords
            .iter()
            .filter(|k| haystack.contains(*k))
            .map(|k| k.to_string())
            .collect();
        if matches.len() > best_matches.len() {
            best = *category;
            best_matches = matches;
        }
    }
    (best, best_matches)
}

fn detect_skill_level(haystack: &str) -> SkillLevel {
    // Highest matched level wins; default beginner
    if ["elite", "professional", "pro level"]
        .iter()
        .any(|k| haystack.contains(k))
    {
        SkillLevel::Elite
    } else if haystack.contains("advanced") {
        SkillLevel::Advanced
    } else if haystack.contains("intermediate") {
        SkillLevel::Intermediate
    } else {
        SkillLevel::Beginner
    }
}

fn detect_equipment(haystack: &str) -> Vec<String> {
    let tokens: Vec<&str> = haystack
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut equipment = Vec::new();
    for (name, pattern) in EQUIPMENT_VOCABULARY {
        let found = if pattern.contains(' ') {
            haystack.contains(pattern)
        } else {
            // Token match avoids false positives like "football" → "ball"
            tokens
                .iter()
                .any(|t| *t == *pattern || t.strip_suffix('s') == Some(pattern))
        };
        if found {
            equipment.push(name.to_string());
        }
    }
    equipment
}

fn gar_for_category(category: Category) -> Option<GarComponent> {
    match category {
        Category::Speed => Some(GarComponent::Sprint),
        Category::Agility => Some(GarComponent::ChangeOfDirection),
        Category::Strength => Some(GarComponent::Strength),
        Category::Conditioning => Some(GarComponent::Endurance),
        Category::Skill | Category::Technique | Category::Unknown => None,
    }
}
