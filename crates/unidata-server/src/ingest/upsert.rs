use std::sync::Arc;

use unidata_common::{types::UnifiedRecord, Result, UnidataError};

use crate::store::{RecordStore, UpsertOutcome};

/// Idempotent writer used by every ingestion path
#[derive(Clone)]
pub struct Upserter {
    store: Arc<dyn RecordStore>,
}

impl Upserter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Insert or fully replace the record stored under `(source_id, id)`.
    ///
    /// Any store failure is reported as [`UnidataError::Persistence`].
    pub async fn upsert(&self, record: &UnifiedRecord) -> Result<UpsertOutcome> {
        self.store.upsert(record).await.map_err(|e| match e {
            UnidataError::Persistence(_) => e,
            other => UnidataError::persistence(other.to_string()),
        })
    }
}
