//! Media item record and analysis result entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::MediaStatus;

/// Structural validation failures, rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("id must be positive, got {0}")]
    NonPositiveId(i64),

    #[error("title must not be blank")]
    BlankTitle,

    #[error("locator must not be blank")]
    BlankLocator,

    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

/// One uploaded media item and its processing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Globally unique, strictly increasing identity. Immutable.
    pub id: i64,
    /// Title supplied at upload time
    pub title: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Opaque reference to the stored media, owned by the storage layer
    pub locator: String,
    /// Current processing status
    pub status: MediaStatus,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last written
    pub updated_at: DateTime<Utc>,
    /// Media duration in seconds, set by the worker on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Error message, present only for failed items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Analysis results, deduplicated by `(content, offset)`
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

impl MediaItem {
    /// Create a new record in the initial `Queued` state.
    pub fn new(id: i64, title: impl Into<String>, locator: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            description: None,
            locator: locator.into(),
            status: MediaStatus::Queued,
            created_at: now,
            updated_at: now,
            duration: None,
            error_message: None,
            results: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Structural validation applied before the record reaches the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::NonPositiveId(self.id));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if self.locator.trim().is_empty() {
            return Err(ValidationError::BlankLocator);
        }
        Ok(())
    }
}

/// One analysis result produced by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Detected content label
    pub content: String,
    /// Offset into the media, in seconds
    pub offset: i64,
}

impl ResultEntry {
    pub fn new(content: impl Into<String>, offset: i64) -> Self {
        Self {
            content: content.into(),
            offset,
        }
    }

    /// Per-entry boundary validation: non-blank content, non-negative offset.
    pub fn is_valid(&self) -> bool {
        !self.content.trim().is_empty() && self.offset >= 0
    }

    /// Dedup key for set semantics.
    pub fn key(&self) -> (&str, i64) {
        (self.content.as_str(), self.offset)
    }
}

/// Split incoming entries into the valid subset and a dropped count.
///
/// Invalid entries never fail the batch; callers log the count.
pub fn filter_valid_entries(entries: &[ResultEntry]) -> (Vec<ResultEntry>, usize) {
    let valid: Vec<ResultEntry> = entries.iter().filter(|e| e.is_valid()).cloned().collect();
    let dropped = entries.len() - valid.len();
    (valid, dropped)
}

/// Union of existing and incoming entries, deduplicated by `(content, offset)`.
///
/// Existing entries keep their position; new entries are appended in input
/// order. Entry order carries no meaning, this just keeps writes stable.
pub fn merge_results(existing: &[ResultEntry], incoming: &[ResultEntry]) -> Vec<ResultEntry> {
    let mut seen: std::collections::HashSet<(String, i64)> = existing
        .iter()
        .map(|e| (e.content.clone(), e.offset))
        .collect();

    let mut merged = existing.to_vec();
    for entry in incoming {
        if seen.insert((entry.content.clone(), entry.offset)) {
            merged.push(entry.clone());
        }
    }
    merged
}
