//! Queue message wire type.
//!
//! Produced by the ingestion pipeline, consumed by the external worker.
//! The wire shape is fixed: `{ "id": <integer>, "locator": <string>,
//! "timestamp": <RFC 3339 string> }` as UTF-8 JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One processing job handed to the worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    /// Media item id, matches the stored record
    pub id: i64,
    /// Opaque reference to the stored media
    pub locator: String,
    /// When the job was issued
    pub timestamp: DateTime<Utc>,
}

impl JobMessage {
    /// Create a job message stamped with the current time.
    pub fn new(id: i64, locator: impl Into<String>) -> Self {
        Self {
            id,
            locator: locator.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_has_exact_field_names() {
        let msg = JobMessage::new(42, "media/42.mp4");
        let json = serde_json::to_value(&msg).expect("serialize JobMessage");
        let obj = json.as_object().expect("object");
        assert_eq!(obj.len(), 3);
        assert_eq!(obj["id"], 42);
        assert_eq!(obj["locator"], "media/42.mp4");
        assert!(obj["timestamp"].is_string());
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let msg = JobMessage::new(1, "media/1.mp4");
        let json = serde_json::to_string(&msg).unwrap();
        let decoded: JobMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, msg);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let ts = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
