//! Domain models for the tagging worker

pub mod classification;
pub mod drill;
pub mod media_asset;

pub use classification::{
    normalize_label, Category, ClassificationResult, GarComponent, SkillLevel, Sport,
};
pub use drill::{Drill, DrillStatus, InstructionStep};
pub use media_asset::{MediaAsset, ProcessingLogEntry};
