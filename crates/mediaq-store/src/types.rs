//! Firestore REST API wire types.
//!
//! Only the subset the store adapter needs: documents, field masks,
//! and the commit request used for server-side increments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firestore document value types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    pub create_time: Option<String>,
    /// Update time
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }
}

/// Document field mask for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMask {
    pub field_paths: Vec<String>,
}

// ============================================================================
// Commit types (server-side field transforms)
// ============================================================================

/// A server-side transform applied to a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTransform {
    pub field_path: String,
    /// Atomic add of the given integer/double value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub increment: Option<Value>,
}

/// Transform applied to one document inside a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTransform {
    /// Full resource name of the document to transform.
    pub document: String,
    pub field_transforms: Vec<FieldTransform>,
}

/// A single write operation in a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// Update or insert a document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Document>,

    /// Apply a server-side transform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<DocumentTransform>,

    /// Field mask for partial updates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_mask: Option<DocumentMask>,
}

impl Write {
    /// Build a transform-only write that increments `field_path` by `delta`.
    ///
    /// The transform upserts: a missing document is created with the field
    /// starting from zero before the increment is applied.
    pub fn increment(document: String, field_path: impl Into<String>, delta: i64) -> Self {
        Self {
            update: None,
            transform: Some(DocumentTransform {
                document,
                field_transforms: vec![FieldTransform {
                    field_path: field_path.into(),
                    increment: Some(Value::IntegerValue(delta.to_string())),
                }],
            }),
            update_mask: None,
        }
    }
}

/// Commit request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub writes: Vec<Write>,
}

/// Result of a single write in a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Update time of the written document.
    pub update_time: Option<String>,
    /// Results of field transforms, in request order.
    pub transform_results: Option<Vec<Value>>,
}

/// Commit response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// Results for each write, in order.
    pub write_results: Option<Vec<WriteResult>>,
    /// Server commit timestamp.
    pub commit_time: Option<String>,
}

impl CommitResponse {
    /// Extract the integer result of the first field transform.
    pub fn first_transform_integer(&self) -> Option<i64> {
        let results = self.write_results.as_ref()?.first()?;
        match results.transform_results.as_ref()?.first()? {
            Value::IntegerValue(s) => s.parse().ok(),
            _ => None,
        }
    }
}

// ============================================================================
// Value conversion traits
// ============================================================================

/// Convert a Rust value to a Firestore Value.
pub trait ToStoreValue {
    fn to_store_value(&self) -> Value;
}

impl ToStoreValue for String {
    fn to_store_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToStoreValue for &str {
    fn to_store_value(&self) -> Value {
        Value::StringValue(self.to_string())
    }
}

impl ToStoreValue for i64 {
    fn to_store_value(&self) -> Value {
        Value::IntegerValue(self.to_string())
    }
}

impl ToStoreValue for u64 {
    fn to_store_value(&self) -> Value {
        Value::IntegerValue((*self as i64).to_string())
    }
}

impl ToStoreValue for bool {
    fn to_store_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

impl ToStoreValue for DateTime<Utc> {
    fn to_store_value(&self) -> Value {
        Value::TimestampValue(self.to_rfc3339())
    }
}

impl<T: ToStoreValue> ToStoreValue for Option<T> {
    fn to_store_value(&self) -> Value {
        match self {
            Some(v) => v.to_store_value(),
            None => Value::NullValue(()),
        }
    }
}

impl<T: ToStoreValue> ToStoreValue for Vec<T> {
    fn to_store_value(&self) -> Value {
        Value::ArrayValue(ArrayValue {
            values: Some(self.iter().map(|v| v.to_store_value()).collect()),
        })
    }
}

/// Convert a Firestore Value back to a Rust type.
pub trait FromStoreValue: Sized {
    fn from_store_value(value: &Value) -> Option<Self>;
}

impl FromStoreValue for String {
    fn from_store_value(value: &Value) -> Option<Self> {
        match value {
            Value::StringValue(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromStoreValue for i64 {
    fn from_store_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as i64),
            _ => None,
        }
    }
}

impl FromStoreValue for u64 {
    fn from_store_value(value: &Value) -> Option<Self> {
        match value {
            Value::IntegerValue(s) => s.parse().ok(),
            Value::DoubleValue(f) => Some(*f as u64),
            _ => None,
        }
    }
}

impl FromStoreValue for bool {
    fn from_store_value(value: &Value) -> Option<Self> {
        match value {
            Value::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromStoreValue for DateTime<Utc> {
    fn from_store_value(value: &Value) -> Option<Self> {
        match value {
            Value::TimestampValue(s) => DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_round_trip_through_string_encoding() {
        let v = 42i64.to_store_value();
        assert!(matches!(&v, Value::IntegerValue(s) if s == "42"));
        assert_eq!(i64::from_store_value(&v), Some(42));
    }

    #[test]
    fn increment_write_serializes_transform() {
        let w = Write::increment("projects/p/databases/d/documents/counters/c".into(), "value", 1);
        let json = serde_json::to_value(&w).unwrap();
        let transform = &json["transform"];
        assert_eq!(
            transform["document"],
            "projects/p/databases/d/documents/counters/c"
        );
        assert_eq!(transform["fieldTransforms"][0]["fieldPath"], "value");
        assert_eq!(
            transform["fieldTransforms"][0]["increment"]["integerValue"],
            "1"
        );
        assert!(json.get("update").is_none());
    }

    #[test]
    fn commit_response_extracts_transform_integer() {
        let body = r#"{
            "writeResults": [
                {"updateTime": "2025-01-01T00:00:00Z",
                 "transformResults": [{"integerValue": "7"}]}
            ],
            "commitTime": "2025-01-01T00:00:00Z"
        }"#;
        let resp: CommitResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.first_transform_integer(), Some(7));
    }

    #[test]
    fn commit_response_without_transform_yields_none() {
        let resp: CommitResponse = serde_json::from_str(r#"{"writeResults": [{}]}"#).unwrap();
        assert_eq!(resp.first_transform_integer(), None);
    }
}
