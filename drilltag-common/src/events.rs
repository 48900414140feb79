//! Typed pipeline events and the in-process event bus
//!
//! Every stage of the media-ingestion pipeline communicates through
//! `PipelineEvent` values carried over an `EventBus`. The bus is an
//! injectable instance held in application state (never a process-wide
//! singleton) so tests can substitute a deterministic one.
//!
//! Delivery is in-process and at-most-once: events emitted before a
//! subscriber attaches, or past the channel capacity of a lagging
//! subscriber, are dropped. Durable at-least-once delivery would require
//! backing this with a persistent queue.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Tag set attached to a newly classified drill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrillTags {
    /// Free-text descriptive tags produced by classification
    pub ai_tags: Vec<String>,
    /// Sport wire value (closed enum, lowercase snake_case)
    pub sport: String,
    /// Drill category wire value
    pub category: String,
    /// Skill level wire value
    pub skill_level: String,
    /// Detected equipment, order as detected
    pub equipment: Vec<String>,
    /// Optional GAR component tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gar_component: Option<String>,
}

/// Pipeline event types
///
/// One variant per event name; payload shapes are fixed at compile time so
/// a malformed payload cannot reach a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A media file finished uploading and entered the pipeline
    MediaUploaded {
        media_asset_id: Uuid,
        file_name: String,
        file_type: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Transcription stage produced a transcript for a media asset
    MediaTranscribed {
        media_asset_id: Uuid,
        transcript: String,
        word_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Tagging stage classified a media asset into a draft drill
    DrillTagged {
        drill_id: Uuid,
        media_asset_id: Uuid,
        tags: DrillTags,
        ai_confidence: f64,
        /// Model identifier that produced the classification
        /// ("keyword-fallback" when the heuristic classifier was used)
        model: String,
        processing_time_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PipelineEvent {
    /// Get event type as string for filtering and logging
    pub fn event_type(&self) -> &str {
        match self {
            PipelineEvent::MediaUploaded { .. } => "MediaUploaded",
            PipelineEvent::MediaTranscribed { .. } => "MediaTranscribed",
            PipelineEvent::DrillTagged { .. } => "DrillTagged",
        }
    }

    /// Media asset this event refers to
    pub fn media_asset_id(&self) -> Uuid {
        match self {
            PipelineEvent::MediaUploaded { media_asset_id, .. }
            | PipelineEvent::MediaTranscribed { media_asset_id, .. }
            | PipelineEvent::DrillTagged { media_asset_id, .. } => *media_asset_id,
        }
    }
}

/// Publish/subscribe bus connecting pipeline stages
///
/// Thin wrapper over `tokio::sync::broadcast`. Cloning shares the
/// underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Once a subscriber falls more than `capacity` events behind, the
    /// oldest unread events are dropped for that subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received. A single
    /// subscriber sees events in emission order.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all current subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` otherwise. Callers treat the error as non-fatal: log and
    /// continue.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PipelineEvent,
    ) -> Result<usize, broadcast::error::SendError<PipelineEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    pub fn emit_lossy(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
