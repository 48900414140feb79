//! Inference endpoint client for drill classification
//!
//! Thin wrapper around an Ollama-compatible HTTP API. Builds a fixed
//! prompt embedding the closed sport/category/skill-level lists, sends a
//! non-streaming generate request with low sampling temperature, and
//! parses the structured JSON answer (tolerating markdown code fences).
//!
//! Every failure mode (network, timeout, non-2xx, unparseable body) is a
//! typed `ClassifierError` so the orchestrator can apply the fallback
//! classifier. No retries happen here; a retry is a redelivered event.

use crate::models::{Category, ClassificationResult, GarComponent, SkillLevel, Sport};
use drilltag_common::config::OllamaConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Transcript text beyond this length is truncated before prompting
const MAX_TRANSCRIPT_CHARS: usize = 2000;

/// Confidence assigned when the model answers JSON but omits a confidence
const PARSE_FAILURE_CONFIDENCE: f64 = 0.3;

/// Classification client errors
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Inference request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Ollama generate request body
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    num_ctx: u32,
}

/// Ollama generate response body
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Raw classification shape as produced by the model
///
/// Field-level defaults implement the parse-failure record: a response
/// that is valid JSON but misses fields still yields a usable (low
/// confidence) classification.
#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    sport: String,
    #[serde(default)]
    category: String,
    #[serde(default, alias = "skillLevel")]
    skill_level: String,
    #[serde(default)]
    equipment: Vec<String>,
    #[serde(default, alias = "garComponent")]
    gar_component: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default, alias = "aiTags")]
    ai_tags: Vec<String>,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default = "default_reasoning")]
    reasoning: String,
}

fn default_confidence() -> f64 {
    PARSE_FAILURE_CONFIDENCE
}

fn default_reasoning() -> String {
    "parse failure".to_string()
}

/// Classification client for an Ollama-compatible inference endpoint
pub struct OllamaClient {
    http_client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Model identifier recorded on classifications produced by this client
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Classify a transcript + filename pair into a drill classification
    ///
    /// Empty or very short transcripts still produce a classification; the
    /// filename alone carries signal for the model.
    pub async fn classify(
        &self,
        transcript: &str,
        file_name: &str,
        file_type: &str,
    ) -> Result<ClassificationResult, ClassifierError> {
        let prompt = build_prompt(transcript, file_name, file_type);

        let request = GenerateRequest {
            model: &self.config.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                num_ctx: self.config.num_ctx,
            },
        };

        tracing::debug!(
            model = %self.config.model,
            file_name = %file_name,
            transcript_chars = transcript.len(),
            "Querying inference endpoint"
        );

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.config.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), error_text));
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        parse_classification(&generate_response.response)
    }

    /// Check the inference backend and list available models
    ///
    /// Called once at startup; a failure is logged and non-fatal since the
    /// worker can run on the keyword fallback alone.
    pub async fn health_check(&self) -> Result<Vec<String>, ClassifierError> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.config.endpoint))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClassifierError::Timeout
                } else {
                    ClassifierError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Api(status.as_u16(), error_text));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::Parse(e.to_string()))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// Build the fixed classification prompt
///
/// The enumerated lists are closed-world choices; the model is told to
/// answer with JSON only.
fn build_prompt(transcript: &str, file_name: &str, file_type: &str) -> String {
    let bounded: String = transcript.chars().take(MAX_TRANSCRIPT_CHARS).collect();
    let sports: Vec<&str> = Sport::CHOICES.iter().map(|s| s.as_str()).collect();
    let categories: Vec<&str> = Category::CHOICES.iter().map(|c| c.as_str()).collect();
    let levels: Vec<&str> = SkillLevel::CHOICES.iter().map(|l| l.as_str()).collect();

    format!(
        "You are a sports training video classifier. Classify the drill \
         described by the transcript and filename below.\n\
         \n\
         Filename: {file_name}\n\
         File type: {file_type}\n\
         Transcript: {bounded}\n\
         \n\
         Answer with a single JSON object and nothing else, using exactly \
         these keys:\n\
         {{\n\
         \"sport\": one of [{sports}],\n\
         \"category\": one of [{categories}],\n\
         \"skillLevel\": one of [{levels}],\n\
         \"equipment\": array of equipment names mentioned,\n\
         \"garComponent\": one of [sprint, change_of_direction, vertical, strength, endurance] or null,\n\
         \"position\": player position string or null,\n\
         \"aiTags\": array of up to 5 short descriptive tags,\n\
         \"confidence\": number between 0.0 and 1.0,\n\
         \"reasoning\": one sentence explaining the classification\n\
         }}",
        file_name = file_name,
        file_type = file_type,
        bounded = bounded,
        sports = sports.join(", "),
        categories = categories.join(", "),
        levels = levels.join(", "),
    )
}

/// Strip an optional markdown code fence from a model answer
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse a model answer into a classification result
fn parse_classification(answer: &str) -> Result<ClassificationResult, ClassifierError> {
    let body = strip_code_fence(answer);

    // Models occasionally wrap the object in prose; retry on the outermost
    // brace span before giving up.
    let raw: RawClassification = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(first_err) => {
            let start = body.find('{');
            let end = body.rfind('}');
            match (start, end) {
                (Some(start), Some(end)) if start < end => {
                    serde_json::from_str(&body[start..=end])
                        .map_err(|e| ClassifierError::Parse(e.to_string()))?
                }
                _ => return Err(ClassifierError::Parse(first_err.to_string())),
            }
        }
    };

    Ok(ClassificationResult {
        sport: Sport::parse(&raw.sport),
        category: Category::parse(&raw.category),
        skill_level: SkillLevel::parse(&raw.skill_level),
        equipment: raw.equipment,
        gar_component: raw.gar_component.as_deref().and_then(GarComponent::parse),
        position: raw.position.filter(|p| !p.trim().is_empty()),
        ai_tags: raw.ai_tags,
        confidence: ClassificationResult::clamp_confidence(raw.confidence),
        reasoning: raw.reasoning,
    })
}
