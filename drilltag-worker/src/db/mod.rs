//! Database access for the tagging worker
//!
//! Pool initialization and schema live in `drilltag_common::db`; this
//! module holds the worker's own queries.

pub mod drills;
pub mod media_assets;
pub mod pipeline_stages;

pub use pipeline_stages::{StageRecord, StageStatus};
