//! End-to-end tagging workflow tests
//!
//! Drive the worker through the event bus the way the upstream
//! transcription stage does, with a local mock inference endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use uuid::Uuid;

use drilltag_common::config::OllamaConfig;
use drilltag_common::{EventBus, PipelineEvent};
use drilltag_worker::db::{drills, media_assets, StageStatus};
use drilltag_worker::models::{DrillStatus, MediaAsset, SkillLevel, Sport};
use drilltag_worker::services::OllamaClient;
use drilltag_worker::workflow::{run_tagging_worker, StageTracker, FALLBACK_MODEL};
use drilltag_worker::AppState;

/// Spawn a mock Ollama server answering every generate request with the
/// given response text; returns its base URL
async fn spawn_mock_ollama(response_text: &'static str) -> String {
    let app = Router::new()
        .route(
            "/api/generate",
            post(move || async move {
                Json(serde_json::json!({ "response": response_text }))
            }),
        )
        .route(
            "/api/tags",
            get(|| async { Json(serde_json::json!({ "models": [{ "name": "llama3.1" }] })) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn state_with_endpoint(endpoint: String) -> AppState {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:").await.unwrap();
    drilltag_common::db::init_tables(&pool).await.unwrap();

    let config = OllamaConfig {
        endpoint,
        timeout_secs: 2,
        ..OllamaConfig::default()
    };
    let classifier = Arc::new(OllamaClient::new(config).unwrap());
    AppState::new(pool, EventBus::new(64), classifier)
}

async fn insert_asset(state: &AppState, file_name: &str) -> MediaAsset {
    let asset = MediaAsset {
        id: Uuid::new_v4(),
        file_name: file_name.to_string(),
        file_type: "video/mp4".to_string(),
        processing_log: vec![],
    };
    media_assets::insert_media_asset(&state.db, &asset).await.unwrap();
    asset
}

fn transcribed(asset: &MediaAsset, transcript: &str) -> PipelineEvent {
    PipelineEvent::MediaTranscribed {
        media_asset_id: asset.id,
        transcript: transcript.to_string(),
        word_count: transcript.split_whitespace().count(),
        timestamp: Utc::now(),
    }
}

/// Wait for the next DrillTagged event, ignoring the others
async fn next_drill_tagged(
    rx: &mut tokio::sync::broadcast::Receiver<PipelineEvent>,
) -> PipelineEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for DrillTagged")
            .expect("bus closed");
        if matches!(event, PipelineEvent::DrillTagged { .. }) {
            return event;
        }
    }
}

#[tokio::test]
async fn test_happy_path_with_llm_classification() {
    let endpoint = spawn_mock_ollama(
        "```json\n{\"sport\":\"basketball\",\"category\":\"skill\",\"skillLevel\":\"advanced\",\
         \"equipment\":[\"ball\"],\"confidence\":0.92,\"aiTags\":[\"dribbling\",\"coordination\"],\
         \"reasoning\":\"ball handling drill\"}\n```",
    )
    .await;
    let state = state_with_endpoint(endpoint).await;
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(run_tagging_worker(state.clone()));
    tokio::task::yield_now().await;

    let asset = insert_asset(&state, "crossover_series_01.mp4").await;
    let transcript = "Start with a low crossover. Keep your eyes up the whole time. \
                      Attack the basket after the third dribble.";
    state.event_bus.emit(transcribed(&asset, transcript)).unwrap();

    let (drill_id, model, confidence) = match next_drill_tagged(&mut rx).await {
        PipelineEvent::DrillTagged {
            drill_id,
            media_asset_id,
            tags,
            ai_confidence,
            model,
            ..
        } => {
            assert_eq!(media_asset_id, asset.id);
            assert_eq!(tags.sport, "basketball");
            assert_eq!(tags.category, "skill");
            assert_eq!(tags.skill_level, "advanced");
            assert_eq!(tags.equipment, vec!["ball".to_string()]);
            assert_eq!(tags.ai_tags, vec!["dribbling".to_string(), "coordination".to_string()]);
            (drill_id, model, ai_confidence)
        }
        other => panic!("unexpected event: {}", other.event_type()),
    };
    assert_eq!(model, "llama3.1");
    assert_eq!(confidence, 0.92);

    // The drill referenced by the event is already readable
    let drill = drills::load_drill(&state.db, drill_id).await.unwrap().unwrap();
    assert_eq!(drill.media_asset_id, asset.id);
    assert_eq!(drill.status, DrillStatus::Draft);
    assert_eq!(drill.sport, Sport::Basketball);
    assert_eq!(drill.skill_level, SkillLevel::Advanced);
    assert_eq!(drill.title, "Crossover Series 01");
    assert_eq!(drill.instruction_steps.len(), 3);
    assert_eq!(drill.instruction_steps[0].text, "Start with a low crossover");

    // Processing log got exactly one tagged entry
    let loaded = media_assets::load_media_asset(&state.db, asset.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.processing_log.len(), 1);
    let entry = &loaded.processing_log[0];
    assert_eq!(entry.stage, "tagged");
    assert_eq!(entry.status, "completed");
    assert_eq!(entry.details["drill_id"], drill_id.to_string());
    assert_eq!(entry.details["sport"], "basketball");

    // Stage tracker recorded one completed attempt with metadata
    let tracker = StageTracker::new(state.db.clone());
    let attempts = tracker.attempts_for(asset.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].stage, "tagging");
    assert_eq!(attempts[0].status, StageStatus::Completed);
    let metadata = attempts[0].metadata.as_ref().unwrap();
    assert_eq!(metadata["sport"], "basketball");
    assert_eq!(metadata["confidence"], 0.92);
}

#[tokio::test]
async fn test_unreachable_llm_falls_back_and_completes() {
    // Nothing listens on this endpoint; classification fails fast
    let state = state_with_endpoint("http://127.0.0.1:9".to_string()).await;
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(run_tagging_worker(state.clone()));
    tokio::task::yield_now().await;

    let asset = insert_asset(&state, "agility_ladder_drill_03.mp4").await;
    state
        .event_bus
        .emit(transcribed(
            &asset,
            "Run through the ladder as fast as possible, then sprint 20 yards",
        ))
        .unwrap();

    match next_drill_tagged(&mut rx).await {
        PipelineEvent::DrillTagged {
            tags,
            ai_confidence,
            model,
            ..
        } => {
            assert_eq!(model, FALLBACK_MODEL);
            assert_eq!(ai_confidence, 0.5);
            assert_eq!(tags.category, "agility");
            assert_eq!(tags.sport, "football");
            assert!(tags.equipment.contains(&"ladder".to_string()));
            assert_eq!(
                tags.ai_tags,
                vec!["agility".to_string(), "football".to_string(), "training".to_string()]
            );
        }
        other => panic!("unexpected event: {}", other.event_type()),
    }

    let tracker = StageTracker::new(state.db.clone());
    let attempts = tracker.attempts_for(asset.id).await.unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(
        attempts[0].status,
        StageStatus::Completed,
        "classifier failure must not fail the stage"
    );
}

#[tokio::test]
async fn test_garbage_llm_response_falls_back() {
    let endpoint = spawn_mock_ollama("I'm sorry, I cannot classify this video.").await;
    let state = state_with_endpoint(endpoint).await;
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(run_tagging_worker(state.clone()));
    tokio::task::yield_now().await;

    let asset = insert_asset(&state, "squat_session.mp4").await;
    state
        .event_bus
        .emit(transcribed(&asset, "Five sets of heavy back squats with a barbell"))
        .unwrap();

    match next_drill_tagged(&mut rx).await {
        PipelineEvent::DrillTagged { tags, model, .. } => {
            assert_eq!(model, FALLBACK_MODEL);
            assert_eq!(tags.category, "strength");
        }
        other => panic!("unexpected event: {}", other.event_type()),
    }
}

#[tokio::test]
async fn test_missing_asset_fails_stage_no_event_no_drill() {
    let state = state_with_endpoint("http://127.0.0.1:9".to_string()).await;
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(run_tagging_worker(state.clone()));
    tokio::task::yield_now().await;

    let missing = Uuid::new_v4();
    state
        .event_bus
        .emit(PipelineEvent::MediaTranscribed {
            media_asset_id: missing,
            transcript: "some transcript".to_string(),
            word_count: 2,
            timestamp: Utc::now(),
        })
        .unwrap();

    // Wait for the failed attempt to land
    let tracker = StageTracker::new(state.db.clone());
    let mut attempts = vec![];
    for _ in 0..100 {
        attempts = tracker.attempts_for(missing).await.unwrap();
        if attempts.iter().any(|a| a.status != StageStatus::Processing) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].status, StageStatus::Failed);
    assert!(attempts[0].error.as_ref().unwrap().contains("not found"));
    assert_eq!(drills::count_drills_for_asset(&state.db, missing).await.unwrap(), 0);
    assert!(
        rx.try_recv().is_err(),
        "no DrillTagged event may be emitted for a missing asset"
    );
}

#[tokio::test]
async fn test_duplicate_delivery_appends_without_corruption() {
    let state = state_with_endpoint("http://127.0.0.1:9".to_string()).await;
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(run_tagging_worker(state.clone()));
    tokio::task::yield_now().await;

    let asset = insert_asset(&state, "cone_weave.mp4").await;
    let transcript = "Weave through the cones keeping a low stance";

    for _ in 0..3 {
        state.event_bus.emit(transcribed(&asset, transcript)).unwrap();
        next_drill_tagged(&mut rx).await;
    }

    // Three runs: three drills, three log entries, earlier entries intact
    assert_eq!(drills::count_drills_for_asset(&state.db, asset.id).await.unwrap(), 3);

    let log = media_assets::load_media_asset(&state.db, asset.id)
        .await
        .unwrap()
        .unwrap()
        .processing_log;
    assert_eq!(log.len(), 3);
    assert!(log.iter().all(|e| e.stage == "tagged" && e.status == "completed"));
    assert!(log.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    let tracker = StageTracker::new(state.db.clone());
    let attempts = tracker.attempts_for(asset.id).await.unwrap();
    assert_eq!(attempts.len(), 3);
    assert!(attempts.iter().all(|a| a.status == StageStatus::Completed));
}

#[tokio::test]
async fn test_independent_assets_processed_concurrently() {
    let state = state_with_endpoint("http://127.0.0.1:9".to_string()).await;
    let mut rx = state.event_bus.subscribe();
    tokio::spawn(run_tagging_worker(state.clone()));
    tokio::task::yield_now().await;

    let assets = [
        insert_asset(&state, "sprint_starts.mp4").await,
        insert_asset(&state, "dribble_series.mp4").await,
        insert_asset(&state, "goalkeeper_warmup.mp4").await,
    ];
    for asset in &assets {
        state
            .event_bus
            .emit(transcribed(asset, "Work through the drill at full intensity"))
            .unwrap();
    }

    let mut tagged = std::collections::HashSet::new();
    for _ in 0..assets.len() {
        match next_drill_tagged(&mut rx).await {
            PipelineEvent::DrillTagged { media_asset_id, .. } => {
                tagged.insert(media_asset_id);
            }
            _ => unreachable!(),
        }
    }

    // All three assets were tagged, regardless of completion order
    for asset in &assets {
        assert!(tagged.contains(&asset.id));
        assert_eq!(drills::count_drills_for_asset(&state.db, asset.id).await.unwrap(), 1);
    }
}
