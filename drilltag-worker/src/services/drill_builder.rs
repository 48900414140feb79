//! Drill construction from a classification and the source transcript
//!
//! Derives the human-facing fields of a draft drill: title (cleaned
//! filename, or generated from tags when the filename carries no signal),
//! description prefix, and a short list of instruction steps split from
//! the transcript.

use crate::models::{ClassificationResult, InstructionStep};

/// Cap on derived instruction steps
const MAX_STEPS: usize = 5;

/// Default duration assigned to each derived step
const DEFAULT_STEP_DURATION_SECS: u32 = 30;

/// Sentence fragments shorter than this are discarded as noise
const MIN_STEP_CHARS: usize = 10;

const DESCRIPTION_CHARS: usize = 500;
const SHORT_DESCRIPTION_CHARS: usize = 150;

/// Filename tokens that carry no drill information
const GENERIC_TOKENS: &[&str] = &[
    "img", "image", "dsc", "mov", "video", "vid", "clip", "untitled", "rec", "export", "final",
    "copy", "new",
];

/// Derive a drill title
///
/// Prefers the cleaned original filename; falls back to
/// `"<Sport> <Category> Drill - <SkillLevel>"` when the filename is
/// uninformative (camera defaults, bare numbers).
pub fn derive_title(file_name: &str, classification: &ClassificationResult) -> String {
    match clean_file_name(file_name) {
        Some(title) => title,
        None => format!(
            "{} {} Drill - {}",
            display_name(classification.sport.as_str()),
            display_name(classification.category.as_str()),
            display_name(classification.skill_level.as_str()),
        ),
    }
}

/// Clean a filename into a title, or None if it carries no signal
fn clean_file_name(file_name: &str) -> Option<String> {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _ext)| stem)
        .unwrap_or(file_name);

    let words: Vec<String> = stem
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect();

    // Informative means at least one word that is neither a number nor a
    // generic camera/export token
    let informative = words.iter().any(|w| {
        let lower = w.to_lowercase();
        !lower.chars().all(|c| c.is_ascii_digit()) && !GENERIC_TOKENS.contains(&lower.as_str())
    });

    if informative {
        Some(words.join(" "))
    } else {
        None
    }
}

/// "flag_football" → "Flag Football"
fn display_name(wire: &str) -> String {
    wire.split('_')
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: impl AsRef<str>) -> String {
    let word = word.as_ref();
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Transcript prefix used as the drill description
pub fn derive_description(transcript: &str) -> (String, String) {
    let description: String = transcript.trim().chars().take(DESCRIPTION_CHARS).collect();
    let short_description: String = transcript
        .trim()
        .chars()
        .take(SHORT_DESCRIPTION_CHARS)
        .collect();
    (description, short_description)
}

/// Naive sentence-split of the transcript into at most five steps
pub fn derive_steps(transcript: &str) -> Vec<InstructionStep> {
    transcript
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.len() >= MIN_STEP_CHARS)
        .take(MAX_STEPS)
        .enumerate()
        .map(|(idx, text)| InstructionStep {
            step_number: idx as u32 + 1,
            text: text.to_string(),
            duration_seconds: DEFAULT_STEP_DURATION_SECS,
        })
        .collect()
}
