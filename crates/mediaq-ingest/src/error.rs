//! Ingestion error taxonomy.

use thiserror::Error;

use mediaq_models::{MediaStatus, ValidationError};
use mediaq_queue::QueueError;
use mediaq_store::StoreError;

pub type IngestResult<T> = Result<T, IngestError>;

/// Errors surfaced to the upload, worker, and read boundaries.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Malformed input, rejected before any backing service is touched.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Status move the state machine forbids.
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: MediaStatus, to: MediaStatus },

    /// No record for the given id.
    #[error("Item not found: {0}")]
    NotFound(String),

    /// Duplicate id on insert. Ids come from the sequence generator, so
    /// a duplicate means the sequence itself is suspect.
    #[error("Duplicate item: {0}")]
    Conflict(String),

    /// The durable store could not complete the operation.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The broker rejected the job after the full retry budget.
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    /// The concrete pipeline could not be wired together at startup.
    #[error("Composition failed: {0}")]
    Composition(String),
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(v) => IngestError::Validation(v),
            StoreError::NotFound(path) => IngestError::NotFound(path),
            StoreError::AlreadyExists(path) => IngestError::Conflict(path),
            other => IngestError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<QueueError> for IngestError {
    fn from(err: QueueError) -> Self {
        IngestError::PublishFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_onto_taxonomy() {
        let err: IngestError = StoreError::NotFound("media_items/9".into()).into();
        assert!(matches!(err, IngestError::NotFound(_)));

        let err: IngestError = StoreError::AlreadyExists("media_items/9".into()).into();
        assert!(matches!(err, IngestError::Conflict(_)));

        let err: IngestError = StoreError::RequestFailed("boom".into()).into();
        assert!(matches!(err, IngestError::StoreUnavailable(_)));

        let err: IngestError = StoreError::Validation(ValidationError::BlankTitle).into();
        assert!(matches!(err, IngestError::Validation(_)));
    }

    #[test]
    fn queue_errors_surface_as_publish_failed() {
        let err: IngestError = QueueError::PublishFailed {
            attempts: 3,
            last_error: "broker down".into(),
        }
        .into();
        assert!(matches!(err, IngestError::PublishFailed(_)));
    }
}
