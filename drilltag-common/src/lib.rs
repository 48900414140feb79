//! # DrillTag Common Library
//!
//! Shared code for the DrillTag pipeline workers:
//! - Typed pipeline events (`PipelineEvent`) and the `EventBus`
//! - Configuration loading
//! - Database pool initialization and schema
//! - Common error types

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use config::Config;
pub use error::{Error, Result};
pub use events::{DrillTags, EventBus, PipelineEvent};
