//! Versioned cache entry schema.
//!
//! Entries carry an explicit schema version and decode strictly: an
//! unknown field or a version mismatch means the payload was written by
//! different code and is treated as a miss, never partially decoded.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mediaq_models::MediaStatus;

/// Version written by this build. Bump on any field change.
pub const SCHEMA_VERSION: u32 = 1;

/// Cached view of a media item's status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntry {
    /// Schema version of this payload
    pub schema_version: u32,
    /// Media item id
    pub id: i64,
    /// Status at the time of caching
    pub status: MediaStatus,
    /// Duration in seconds, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    /// Error message, when the item failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When this entry was written
    pub cached_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry for the current schema, stamped now.
    pub fn new(id: i64, status: MediaStatus) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id,
            status,
            duration: None,
            error_message: None,
            cached_at: Utc::now(),
        }
    }

    pub fn with_duration(mut self, duration: Option<u64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_error_message(mut self, error_message: Option<String>) -> Self {
        self.error_message = error_message;
        self
    }

    /// True once the entry is close enough to its TTL that serving it
    /// risks handing out data about to disappear mid-read.
    pub fn is_near_expiry(&self, now: DateTime<Utc>, near_expiry_after: std::time::Duration) -> bool {
        let age = now - self.cached_at;
        age >= Duration::from_std(near_expiry_after).unwrap_or_else(|_| Duration::seconds(i64::MAX))
    }
}

/// Strictly decode a cached payload.
///
/// Any decode failure or schema mismatch is a miss; the caller is
/// expected to evict the key and fall through to the store.
pub fn decode(payload: &str) -> Option<CacheEntry> {
    let entry: CacheEntry = match serde_json::from_str(payload) {
        Ok(entry) => entry,
        Err(e) => {
            debug!(error = %e, "Undecodable cache payload, treating as miss");
            return None;
        }
    };

    if entry.schema_version != SCHEMA_VERSION {
        debug!(
            found = entry.schema_version,
            expected = SCHEMA_VERSION,
            "Cache payload from different schema version, treating as miss"
        );
        return None;
    }

    Some(entry)
}
