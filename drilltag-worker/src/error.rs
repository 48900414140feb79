//! Error types for the tagging worker

use thiserror::Error;
use uuid::Uuid;

/// Errors that fail a single tagging attempt
///
/// Classification failures are deliberately absent: they are recovered
/// inside the orchestrator via the fallback classifier and never fail an
/// attempt.
#[derive(Debug, Error)]
pub enum TaggingError {
    /// The referenced media asset does not exist; data integrity issue
    /// upstream, requires manual investigation
    #[error("Media asset not found: {0}")]
    MediaAssetNotFound(Uuid),

    /// A drill or processing-log write failed; the attempt is failed and
    /// retried only by redelivery of the upstream event
    #[error("Persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

/// Result type for tagging attempts
pub type TaggingResult<T> = std::result::Result<T, TaggingError>;
