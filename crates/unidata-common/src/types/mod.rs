//! Domain types shared across the workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Verbatim copy of a source item, kept for forward compatibility.
///
/// Keys keep the order they had in the ingested payload. The record owns this
/// snapshot outright; nothing refers back into the decode buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawData(Map<String, Value>);

impl RawData {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for RawData {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Canonical, source-agnostic representation of one ingested item.
///
/// `(source_id, id)` identifies at most one stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedRecord {
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub raw_data: RawData,
}

impl UnifiedRecord {
    /// Create a record with only the owning source and raw snapshot set
    pub fn new(source_id: impl Into<String>, raw_data: RawData) -> Self {
        Self {
            source_id: source_id.into(),
            id: None,
            city: None,
            is_available: None,
            price: None,
            raw_data,
        }
    }

    /// Composite identity used for idempotent writes
    pub fn key(&self) -> (&str, Option<&str>) {
        (self.source_id.as_str(), self.id.as_deref())
    }
}

/// A Unified Record as returned by the store, with store-managed timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(flatten)]
    pub record: UnifiedRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawData {
        match value {
            Value::Object(map) => RawData::new(map),
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn test_record_serializes_camel_case_and_skips_absent() {
        let mut record = UnifiedRecord::new("source2", raw(json!({"id": "b7"})));
        record.id = Some("b7".to_string());
        record.is_available = Some(false);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["sourceId"], "source2");
        assert_eq!(value["id"], "b7");
        assert_eq!(value["isAvailable"], false);
        assert_eq!(value["rawData"], json!({"id": "b7"}));
        assert!(value.get("city").is_none());
        assert!(value.get("price").is_none());
    }

    #[test]
    fn test_raw_data_keeps_key_order() {
        let data: RawData =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": {"b": 1, "a": 2}}"#).unwrap();
        let keys: Vec<_> = data.as_map().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(
            serde_json::to_string(&data).unwrap(),
            r#"{"zeta":1,"alpha":2,"mid":{"b":1,"a":2}}"#
        );
    }

    #[test]
    fn test_stored_record_flattens() {
        let now = Utc::now();
        let stored = StoredRecord {
            record: UnifiedRecord::new("source1", RawData::default()),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["sourceId"], "source1");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("record").is_none());
    }

    #[test]
    fn test_key() {
        let mut record = UnifiedRecord::new("source1", RawData::default());
        assert_eq!(record.key(), ("source1", None));
        record.id = Some("a1".into());
        assert_eq!(record.key(), ("source1", Some("a1")));
    }
}
