//! Pipeline workflow: the tagging orchestrator and stage bookkeeping

pub mod stage_tracker;
pub mod tagging;

pub use stage_tracker::StageTracker;
pub use tagging::{handle_media_transcribed, run_tagging_worker, FALLBACK_MODEL, TAGGING_STAGE};
