//! Media asset model and its append-only processing log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded file under pipeline processing
///
/// Created at upload (upstream of this worker); this stage only reads it
/// and appends to its processing log.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub id: Uuid,
    pub file_name: String,
    pub file_type: String,
    /// Ordered, append-only record of pipeline stage events
    pub processing_log: Vec<ProcessingLogEntry>,
}

/// One entry of a media asset's processing log
///
/// Entries are only ever appended, never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessingLogEntry {
    pub timestamp: DateTime<Utc>,
    pub stage: String,
    pub status: String,
    /// Arbitrary structured details for the stage
    pub details: serde_json::Value,
}

impl ProcessingLogEntry {
    pub fn new(stage: &str, status: &str, details: serde_json::Value) -> Self {
        Self {
            timestamp: Utc::now(),
            stage: stage.to_string(),
            status: status.to_string(),
            details,
        }
    }
}
