//! Typed repository for media item status records.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use mediaq_models::{filter_valid_entries, merge_results, MediaItem, MediaStatus, ResultEntry};

use crate::client::StoreClient;
use crate::error::{StoreError, StoreResult};
use crate::metrics::{record_dropped_results, record_fetch_deadline};
use crate::types::{ArrayValue, Document, FromStoreValue, MapValue, ToStoreValue, Value};

/// Collection holding media item documents.
const ITEM_COLLECTION: &str = "media_items";

/// Repository for media item documents.
#[derive(Clone)]
pub struct ItemRepository {
    client: StoreClient,
}

impl ItemRepository {
    /// Create a new item repository.
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    fn doc_id(id: i64) -> String {
        id.to_string()
    }

    /// Insert a new record.
    ///
    /// Structural validation runs before any request is sent. A record
    /// with the same id already present is a conflict, never overwritten.
    pub async fn insert(&self, item: &MediaItem) -> StoreResult<()> {
        item.validate()?;

        let fields = item_to_fields(item);
        self.client
            .create_document(ITEM_COLLECTION, &Self::doc_id(item.id), fields)
            .await?;
        info!(id = item.id, "Created media item record");
        Ok(())
    }

    /// Fetch a record by id, bounded by the client's read deadline.
    ///
    /// A read that outlives the deadline is reported as absent rather
    /// than blocking the caller.
    pub async fn fetch_by_id(&self, id: i64) -> StoreResult<Option<MediaItem>> {
        let deadline = self.client.fetch_deadline();
        let doc_id = Self::doc_id(id);
        let fetch = self.client.get_document(ITEM_COLLECTION, &doc_id);

        match tokio::time::timeout(deadline, fetch).await {
            Ok(Ok(Some(doc))) => Ok(Some(document_to_item(&doc)?)),
            Ok(Ok(None)) => Ok(None),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                warn!(id, deadline_ms = deadline.as_millis() as u64, "Fetch hit read deadline, reporting absent");
                record_fetch_deadline();
                Ok(None)
            }
        }
    }

    /// Update the status of a record, touching only the changed fields.
    ///
    /// `error_message` and `duration` are written when present, so a
    /// failure can carry its cause and a completion its measured length.
    /// Moving to any non-`Failed` status clears a previously stored
    /// failure message.
    pub async fn update_status(
        &self,
        id: i64,
        status: MediaStatus,
        error_message: Option<&str>,
        duration: Option<u64>,
    ) -> StoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("status".to_string(), status.as_str().to_store_value());
        fields.insert("updated_at".to_string(), Utc::now().to_store_value());

        let mut mask = vec!["status".to_string(), "updated_at".to_string()];
        if let Some(msg) = error_message {
            fields.insert("error_message".to_string(), msg.to_store_value());
            mask.push("error_message".to_string());
        } else if status != MediaStatus::Failed {
            // Masked but absent fields are deleted, so a record leaving
            // Failed does not keep its old failure message
            mask.push("error_message".to_string());
        }
        if let Some(secs) = duration {
            fields.insert("duration".to_string(), secs.to_store_value());
            mask.push("duration".to_string());
        }

        self.client
            .patch_document(ITEM_COLLECTION, &Self::doc_id(id), fields, mask)
            .await?;
        Ok(())
    }

    /// Append result entries to a record.
    ///
    /// Entries failing boundary validation are dropped one by one without
    /// failing the batch. Entries already present (same content at the
    /// same offset) are not duplicated. An append that adds nothing new
    /// writes nothing.
    pub async fn append_results(&self, id: i64, entries: &[ResultEntry]) -> StoreResult<()> {
        let (valid, dropped) = filter_valid_entries(entries);
        if dropped > 0 {
            warn!(id, dropped, "Dropped invalid result entries");
            record_dropped_results(dropped);
        }
        if valid.is_empty() {
            debug!(id, "No valid result entries to append");
            return Ok(());
        }

        let doc = self
            .client
            .get_document(ITEM_COLLECTION, &Self::doc_id(id))
            .await?
            .ok_or_else(|| StoreError::not_found(format!("{}/{}", ITEM_COLLECTION, id)))?;

        let existing = document_results(&doc);
        let merged = merge_results(&existing, &valid);
        if merged.len() == existing.len() {
            debug!(id, "All result entries already present");
            return Ok(());
        }

        let mut fields = HashMap::new();
        fields.insert("results".to_string(), results_to_value(&merged));
        fields.insert("updated_at".to_string(), Utc::now().to_store_value());

        self.client
            .patch_document(
                ITEM_COLLECTION,
                &Self::doc_id(id),
                fields,
                vec!["results".to_string(), "updated_at".to_string()],
            )
            .await?;

        info!(
            id,
            appended = merged.len() - existing.len(),
            "Appended result entries"
        );
        Ok(())
    }
}

// Conversion helpers

fn item_to_fields(item: &MediaItem) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), item.id.to_store_value());
    fields.insert("title".to_string(), item.title.to_store_value());
    if let Some(ref desc) = item.description {
        fields.insert("description".to_string(), desc.to_store_value());
    }
    fields.insert("locator".to_string(), item.locator.to_store_value());
    fields.insert("status".to_string(), item.status.as_str().to_store_value());
    fields.insert("created_at".to_string(), item.created_at.to_store_value());
    fields.insert("updated_at".to_string(), item.updated_at.to_store_value());
    if let Some(duration) = item.duration {
        fields.insert("duration".to_string(), duration.to_store_value());
    }
    if let Some(ref msg) = item.error_message {
        fields.insert("error_message".to_string(), msg.to_store_value());
    }
    fields.insert("results".to_string(), results_to_value(&item.results));
    fields
}

fn document_to_item(doc: &Document) -> StoreResult<MediaItem> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| StoreError::invalid_response("Document has no fields"))?;

    let get_string = |key: &str| -> Option<String> {
        fields.get(key).and_then(|v| String::from_store_value(v))
    };

    let id = fields
        .get("id")
        .and_then(|v| i64::from_store_value(v))
        .ok_or_else(|| StoreError::invalid_response("Document has no integer id"))?;

    let status_raw = get_string("status")
        .ok_or_else(|| StoreError::invalid_response("Document has no status"))?;
    let status = MediaStatus::parse(&status_raw)?;

    Ok(MediaItem {
        id,
        title: get_string("title").unwrap_or_default(),
        description: get_string("description"),
        locator: get_string("locator").unwrap_or_default(),
        status,
        created_at: fields
            .get("created_at")
            .and_then(|v| chrono::DateTime::from_store_value(v))
            .unwrap_or_else(Utc::now),
        updated_at: fields
            .get("updated_at")
            .and_then(|v| chrono::DateTime::from_store_value(v))
            .unwrap_or_else(Utc::now),
        duration: fields.get("duration").and_then(|v| u64::from_store_value(v)),
        error_message: get_string("error_message"),
        results: document_results(doc),
    })
}

fn document_results(doc: &Document) -> Vec<ResultEntry> {
    doc.fields
        .as_ref()
        .and_then(|f| f.get("results"))
        .map(value_to_results)
        .unwrap_or_default()
}

fn results_to_value(entries: &[ResultEntry]) -> Value {
    let values = entries
        .iter()
        .map(|e| {
            let mut fields = HashMap::new();
            fields.insert("content".to_string(), e.content.to_store_value());
            fields.insert("offset".to_string(), e.offset.to_store_value());
            Value::MapValue(MapValue {
                fields: Some(fields),
            })
        })
        .collect();
    Value::ArrayValue(ArrayValue {
        values: Some(values),
    })
}

fn value_to_results(value: &Value) -> Vec<ResultEntry> {
    let Value::ArrayValue(arr) = value else {
        return Vec::new();
    };
    arr.values
        .as_ref()
        .map(|vals| {
            vals.iter()
                .filter_map(|v| {
                    let Value::MapValue(map) = v else { return None };
                    let fields = map.fields.as_ref()?;
                    let content = fields
                        .get("content")
                        .and_then(|c| String::from_store_value(c))?;
                    let offset = fields.get("offset").and_then(|o| i64::from_store_value(o))?;
                    Some(ResultEntry::new(content, offset))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item() -> MediaItem {
        let mut item = MediaItem::new(7, "Keynote", "media/7.mp4");
        item.results = vec![ResultEntry::new("speech", 12), ResultEntry::new("music", 90)];
        item
    }

    #[test]
    fn item_fields_round_trip_through_document() {
        let item = sample_item();
        let doc = Document::new(item_to_fields(&item));
        let decoded = document_to_item(&doc).unwrap();
        assert_eq!(decoded.id, item.id);
        assert_eq!(decoded.title, item.title);
        assert_eq!(decoded.locator, item.locator);
        assert_eq!(decoded.status, item.status);
        assert_eq!(decoded.results, item.results);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let fields = item_to_fields(&MediaItem::new(1, "t", "l"));
        assert!(!fields.contains_key("description"));
        assert!(!fields.contains_key("duration"));
        assert!(!fields.contains_key("error_message"));
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        let mut fields = item_to_fields(&sample_item());
        fields.insert("status".to_string(), "done".to_store_value());
        let doc = Document::new(fields);
        assert!(matches!(
            document_to_item(&doc),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn malformed_result_entries_are_skipped_on_read() {
        let value = Value::ArrayValue(ArrayValue {
            values: Some(vec![
                Value::StringValue("not a map".to_string()),
                Value::MapValue(MapValue {
                    fields: Some(HashMap::from([
                        ("content".to_string(), "speech".to_store_value()),
                        ("offset".to_string(), 3i64.to_store_value()),
                    ])),
                }),
            ]),
        });
        let entries = value_to_results(&value);
        assert_eq!(entries, vec![ResultEntry::new("speech", 3)]);
    }
}
