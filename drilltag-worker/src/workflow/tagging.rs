//! Tagging orchestrator
//!
//! Subscribes to `MediaTranscribed` events and, per event, runs one
//! tagging attempt as an independent task: classify the transcript (LLM
//! with keyword fallback), persist a draft drill, append to the media
//! asset's processing log, record the stage attempt, and emit
//! `DrillTagged`.
//!
//! Failure policy:
//! - classification errors are recovered via the fallback classifier and
//!   never fail the stage;
//! - a missing media asset or a failed write fails the attempt: stage
//!   recorded `failed`, no event emitted, retry only by event redelivery;
//! - the handler catches everything at its outer boundary, so one bad
//!   asset never takes down processing of the others.
//!
//! The drill insert happens-before the `DrillTagged` emission, so a
//! subscriber can always read the drill id it receives.

use crate::db::{drills, media_assets};
use crate::error::{TaggingError, TaggingResult};
use crate::models::{Drill, ProcessingLogEntry};
use crate::services::{drill_builder, fallback};
use crate::workflow::stage_tracker::StageTracker;
use crate::AppState;
use chrono::Utc;
use drilltag_common::events::{DrillTags, PipelineEvent};
use serde_json::json;
use std::time::Instant;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Stage name used in pipeline_stages records
pub const TAGGING_STAGE: &str = "tagging";

/// Stage name used in the media asset's processing log
const TAGGED_LOG_STAGE: &str = "tagged";

/// Model identifier recorded when the keyword fallback produced the result
pub const FALLBACK_MODEL: &str = "keyword-fallback";

/// Subscribe to the bus and process transcription events until shutdown
///
/// Each event is handled in its own spawned task; media assets are
/// independent and processed concurrently.
pub async fn run_tagging_worker(state: AppState) {
    let mut rx = state.event_bus.subscribe();
    tracing::info!("Tagging worker subscribed to pipeline events");

    loop {
        match rx.recv().await {
            Ok(PipelineEvent::MediaTranscribed {
                media_asset_id,
                transcript,
                word_count,
                ..
            }) => {
                let state = state.clone();
                tokio::spawn(async move {
                    handle_media_transcribed(state, media_asset_id, transcript, word_count).await;
                });
            }
            Ok(event) => {
                tracing::trace!(
                    event_type = event.event_type(),
                    "Event not for this stage, ignoring"
                );
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    skipped = skipped,
                    "Tagging worker lagged behind the event bus; events dropped"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("Event bus closed, tagging worker shutting down");
                break;
            }
        }
    }
}

/// Run one tagging attempt; the outermost error boundary of the stage
///
/// Never panics and never propagates errors: every outcome ends in a
/// finalized stage record (best-effort) and a log line.
pub async fn handle_media_transcribed(
    state: AppState,
    media_asset_id: Uuid,
    transcript: String,
    word_count: usize,
) {
    let started = Instant::now();
    let tracker = StageTracker::new(state.db.clone());
    let attempt = tracker.begin(media_asset_id, TAGGING_STAGE).await;

    tracing::info!(
        media_asset_id = %media_asset_id,
        word_count = word_count,
        "Tagging stage started"
    );

    match tag_media_asset(&state, media_asset_id, &transcript, started).await {
        Ok(outcome) => {
            let processing_time_ms = started.elapsed().as_millis() as i64;
            tracker
                .complete(
                    attempt,
                    processing_time_ms,
                    json!({
                        "drill_id": outcome.drill.id,
                        "sport": outcome.drill.sport.as_str(),
                        "category": outcome.drill.category.as_str(),
                        "confidence": outcome.drill.ai_confidence,
                    }),
                )
                .await;

            let drill = &outcome.drill;
            let event = PipelineEvent::DrillTagged {
                drill_id: drill.id,
                media_asset_id,
                tags: DrillTags {
                    ai_tags: drill.ai_tags.clone(),
                    sport: drill.sport.as_str().to_string(),
                    category: drill.category.as_str().to_string(),
                    skill_level: drill.skill_level.as_str().to_string(),
                    equipment: drill.equipment.clone(),
                    gar_component: drill.gar_component.map(|g| g.as_str().to_string()),
                },
                ai_confidence: drill.ai_confidence,
                model: outcome.model.clone(),
                processing_time_ms: processing_time_ms.max(0) as u64,
                timestamp: Utc::now(),
            };
            if state.event_bus.emit(event).is_err() {
                tracing::warn!(
                    drill_id = %drill.id,
                    "No subscribers for DrillTagged event; downstream stages idle"
                );
            }

            tracing::info!(
                media_asset_id = %media_asset_id,
                drill_id = %drill.id,
                sport = drill.sport.as_str(),
                category = drill.category.as_str(),
                confidence = drill.ai_confidence,
                model = %outcome.model,
                processing_time_ms = processing_time_ms,
                "Tagging stage completed"
            );
        }
        Err(e) => {
            let processing_time_ms = started.elapsed().as_millis() as i64;
            tracing::error!(
                media_asset_id = %media_asset_id,
                error = %e,
                processing_time_ms = processing_time_ms,
                "Tagging stage failed"
            );
            tracker.fail(attempt, processing_time_ms, &e.to_string()).await;
            *state.last_error.write().await = Some(e.to_string());
        }
    }
}

/// Outcome of a successful tagging attempt
struct TaggedOutcome {
    drill: Drill,
    /// Identifier of whichever classifier produced the result
    model: String,
}

/// The attempt body: classify, build, persist, append to the log
async fn tag_media_asset(
    state: &AppState,
    media_asset_id: Uuid,
    transcript: &str,
    started: Instant,
) -> TaggingResult<TaggedOutcome> {
    let asset = media_assets::load_media_asset(&state.db, media_asset_id)
        .await?
        .ok_or(TaggingError::MediaAssetNotFound(media_asset_id))?;

    // LLM failure is recovered here, not allowed to fail the stage
    let (classification, model) = match state
        .classifier
        .classify(transcript, &asset.file_name, &asset.file_type)
        .await
    {
        Ok(classification) => (classification, state.classifier.model().to_string()),
        Err(e) => {
            tracing::warn!(
                media_asset_id = %media_asset_id,
                error = %e,
                "Classification failed, using keyword fallback"
            );
            (
                fallback::classify(transcript, &asset.file_name),
                FALLBACK_MODEL.to_string(),
            )
        }
    };

    let title = drill_builder::derive_title(&asset.file_name, &classification);
    let (description, short_description) = drill_builder::derive_description(transcript);
    let steps = drill_builder::derive_steps(transcript);
    let drill = Drill::draft(
        media_asset_id,
        title,
        description,
        short_description,
        steps,
        &classification,
    );

    drills::save_drill(&state.db, &drill).await?;

    let entry = ProcessingLogEntry::new(
        TAGGED_LOG_STAGE,
        "completed",
        json!({
            "drill_id": drill.id,
            "sport": drill.sport.as_str(),
            "category": drill.category.as_str(),
            "ai_tags": drill.ai_tags,
            "confidence": drill.ai_confidence,
            "processing_time": started.elapsed().as_millis() as u64,
        }),
    );
    media_assets::append_processing_log(&state.db, media_asset_id, &entry).await?;

    Ok(TaggedOutcome { drill, model })
}
