//! In-process record store

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use unidata_common::{
    types::{StoredRecord, UnifiedRecord},
    Result,
};

use super::{RecordStore, UpsertOutcome};
use crate::query::{FilterSet, PageRequest};

/// Record store backed by a `Vec` in insertion order.
///
/// Replacing a record keeps its position, mirroring the sequence-ordered reads
/// of the Postgres store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record, in insertion order
    pub async fn snapshot(&self) -> Vec<StoredRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, record: &UnifiedRecord) -> Result<UpsertOutcome> {
        let now = Utc::now();
        let mut records = self.records.write().await;

        if let Some(existing) = records.iter_mut().find(|r| r.record.key() == record.key()) {
            existing.record = record.clone();
            existing.updated_at = now;
            return Ok(UpsertOutcome::Updated);
        }

        records.push(StoredRecord {
            record: record.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(UpsertOutcome::Inserted)
    }

    async fn find(&self, filters: &FilterSet, page: &PageRequest) -> Result<Vec<StoredRecord>> {
        let records = self.records.read().await;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(0);

        Ok(records
            .iter()
            .filter(|r| filters.matches(&r.record))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filters: &FilterSet) -> Result<i64> {
        let records = self.records.read().await;
        let matching = records.iter().filter(|r| filters.matches(&r.record)).count();
        Ok(i64::try_from(matching).unwrap_or(i64::MAX))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::query::{NumericBounds, Predicate, QueryField};
    use serde_json::json;
    use unidata_common::types::RawData;

    fn listing(source_id: &str, id: Option<&str>, price: f64) -> UnifiedRecord {
        let raw = match json!({ "id": id, "price": price }) {
            serde_json::Value::Object(map) => RawData::new(map),
            _ => unreachable!(),
        };
        let mut record = UnifiedRecord::new(source_id, raw);
        record.id = id.map(String::from);
        record.price = Some(price);
        record
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let store = MemoryRecordStore::new();

        let first = listing("source1", Some("a1"), 100.0);
        assert_eq!(store.upsert(&first).await.unwrap(), UpsertOutcome::Inserted);

        let second = listing("source1", Some("a1"), 80.0);
        assert_eq!(store.upsert(&second).await.unwrap(), UpsertOutcome::Updated);

        let records = store.snapshot().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record.price, Some(80.0));
        assert!(records[0].updated_at >= records[0].created_at);
    }

    #[tokio::test]
    async fn test_same_id_in_different_sources_is_distinct() {
        let store = MemoryRecordStore::new();
        store.upsert(&listing("source1", Some("x"), 1.0)).await.unwrap();
        store.upsert(&listing("source2", Some("x"), 2.0)).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_missing_id_shares_one_slot_per_source() {
        let store = MemoryRecordStore::new();
        store.upsert(&listing("source1", None, 1.0)).await.unwrap();
        let outcome = store.upsert(&listing("source1", None, 2.0)).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_filters_then_paginates_in_insertion_order() {
        let store = MemoryRecordStore::new();
        for (i, price) in [50.0, 100.0, 150.0, 110.0].into_iter().enumerate() {
            let id = format!("r{i}");
            store.upsert(&listing("source1", Some(&id), price)).await.unwrap();
        }

        let filters = FilterSet::new(vec![Predicate::Numeric {
            field: QueryField::Price,
            bounds: NumericBounds {
                min: Some(60.0),
                max: Some(120.0),
                ..NumericBounds::default()
            },
        }]);

        assert_eq!(store.count(&filters).await.unwrap(), 2);

        let page = store
            .find(&filters, &PageRequest::new(2, 1).unwrap())
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].record.id.as_deref(), Some("r3"));
    }
}
