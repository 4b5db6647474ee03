//! Ingestion orchestrator
//!
//! Runs the fetch → decode → transform → upsert pipeline for one source or
//! for every registered source in turn.

use futures::StreamExt;
use serde_json::Value;
use std::{collections::BTreeMap, sync::Arc, time::Instant};
use tracing::{error, info, info_span, warn, Instrument};
use unidata_common::{Result, UnidataError};
use uuid::Uuid;

use super::{
    config::IngestConfig,
    decoder::{decode_array_bytes, decode_array_stream},
    fetcher::{body_error, Fetcher},
    registry::{FetchMode, SourceDescriptor, SourceRegistry},
    upsert::Upserter,
};
use crate::store::{RecordStore, UpsertOutcome};

/// Counters for one ingestion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub processed: u64,
    pub inserted: u64,
    pub updated: u64,
}

impl RunStats {
    fn record(&mut self, outcome: UpsertOutcome) {
        self.processed += 1;
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }
}

pub struct IngestOrchestrator {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<Fetcher>,
    upserter: Upserter,
    max_element_len: Option<usize>,
}

impl IngestOrchestrator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<Fetcher>,
        store: Arc<dyn RecordStore>,
        config: &IngestConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            upserter: Upserter::new(store),
            max_element_len: config.max_element_bytes,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Ingest one source, returning the number of records upserted.
    ///
    /// The first item that fails to decode, transform or persist aborts the
    /// run; records upserted before it stay stored.
    pub async fn ingest_one(&self, source_id: &str) -> Result<u64> {
        let source = self
            .registry
            .find(source_id)
            .ok_or_else(|| UnidataError::SourceNotFound(source_id.to_string()))?;

        let run_id = Uuid::new_v4();
        let span = info_span!("ingest", source_id = %source.id, run_id = %run_id);

        async move {
            let started = Instant::now();
            let mut stats = RunStats::default();

            info!(url = %source.url, mode = ?source.fetch_mode, "Ingestion started");

            match self.run(source, &mut stats).await {
                Ok(()) => {
                    info!(
                        processed = stats.processed,
                        inserted = stats.inserted,
                        updated = stats.updated,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Ingestion finished"
                    );
                    Ok(stats.processed)
                },
                Err(e) => {
                    error!(
                        processed = stats.processed,
                        inserted = stats.inserted,
                        updated = stats.updated,
                        error = %e,
                        "Ingestion aborted"
                    );
                    Err(e)
                },
            }
        }
        .instrument(span)
        .await
    }

    /// Ingest every registered source sequentially, in registry order.
    ///
    /// A failing source is logged and counted as 0; the rest still run.
    pub async fn ingest_all(&self) -> BTreeMap<String, u64> {
        let mut results = BTreeMap::new();

        for source in self.registry.list_all() {
            let count = match self.ingest_one(&source.id).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(source_id = %source.id, error = %e, "Source ingestion failed");
                    0
                },
            };
            results.insert(source.id.clone(), count);
        }

        results
    }

    async fn run(&self, source: &SourceDescriptor, stats: &mut RunStats) -> Result<()> {
        match source.fetch_mode {
            FetchMode::Whole => {
                let body = self.fetcher.fetch_all(&source.url).await?;
                for item in decode_array_bytes(&body)? {
                    self.process(source, item, stats).await?;
                }
            },
            FetchMode::Streaming => {
                let body = self.fetcher.open_stream(&source.url).await?;
                let mut items = decode_array_stream(body, self.max_element_len);
                while let Some(item) = items.next().await {
                    let item = item.map_err(|e| body_error(&source.url, e))?;
                    self.process(source, item, stats).await?;
                }
            },
        }
        Ok(())
    }

    async fn process(
        &self,
        source: &SourceDescriptor,
        item: Value,
        stats: &mut RunStats,
    ) -> Result<()> {
        let record = (source.transform)(&source.id, item)?;
        let outcome = self.upserter.upsert(&record).await?;
        stats.record(outcome);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;

    #[test]
    fn test_run_stats() {
        let mut stats = RunStats::default();
        stats.record(UpsertOutcome::Inserted);
        stats.record(UpsertOutcome::Updated);
        stats.record(UpsertOutcome::Inserted);
        assert_eq!(
            stats,
            RunStats {
                processed: 3,
                inserted: 2,
                updated: 1
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_source_is_not_found() {
        let config = IngestConfig::default();
        let orchestrator = IngestOrchestrator::new(
            Arc::new(SourceRegistry::from_config(&config).unwrap()),
            Arc::new(Fetcher::http_only(&config).unwrap()),
            Arc::new(MemoryRecordStore::new()),
            &config,
        );

        let err = orchestrator.ingest_one("source9").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
