//! Record store abstraction
//!
//! [`RecordStore`] is the persistence seam of the ingestion pipeline and the
//! query API. `db::PgRecordStore` is the production implementation;
//! [`MemoryRecordStore`] keeps records in process for tests and dry runs.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use unidata_common::{
    types::{StoredRecord, UnifiedRecord},
    Result,
};

use crate::query::{FilterSet, PageRequest};

pub use memory::MemoryRecordStore;

/// Whether an upsert created a new record or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Keyed storage for Unified Records.
///
/// Records are identified by `(source_id, id)`. Reads return records in the
/// order they were first inserted.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert the record, or fully replace the one stored under the same key.
    ///
    /// `created_at` of a replaced record is preserved; `updated_at` is refreshed.
    async fn upsert(&self, record: &UnifiedRecord) -> Result<UpsertOutcome>;

    /// One page of records matching every predicate in `filters`
    async fn find(&self, filters: &FilterSet, page: &PageRequest) -> Result<Vec<StoredRecord>>;

    /// Number of records matching `filters`
    async fn count(&self, filters: &FilterSet) -> Result<i64>;

    /// Check that the backing storage is reachable
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
