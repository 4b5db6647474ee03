//! Unidata Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Ingests heterogeneous JSON datasets into one Unified Record table and
//! serves them back through filtered, paginated queries.
//!
//! # Overview
//!
//! - **Ingestion**: source registry, object-storage fetch with HTTP fallback,
//!   streaming JSON array decoding, per-source transforms and idempotent upserts
//! - **Query**: enumerated filter fields turned into typed predicates
//! - **Storage**: Postgres record store (SQLx) and an in-memory store
//! - **API**: Axum routes for querying and triggering ingestion
//!
//! # Architecture
//!
//! HTTP routes are organized as feature slices under [`features`], each with
//! its own `queries/` (reads) or `commands/` (writes) and a `routes.rs`.
//! The ingestion core in [`ingest`] is independent of HTTP and is also driven
//! by the `unidata-ingest` command-line tool.
//!
//! ```text
//!   SourceRegistry ──► Fetcher ──► Decoder ──► Transform ──► Upserter ──► RecordStore
//!                     (S3 │ HTTP)   (whole │ stream)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unidata_server::{
//!     ingest::{config::IngestConfig, Fetcher, IngestOrchestrator, SourceRegistry},
//!     store::MemoryRecordStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::from_env()?;
//!     let registry = Arc::new(SourceRegistry::from_config(&config)?);
//!     let fetcher = Arc::new(Fetcher::http_only(&config)?);
//!     let store = Arc::new(MemoryRecordStore::new());
//!
//!     let orchestrator = IngestOrchestrator::new(registry, fetcher, store, &config);
//!     let count = orchestrator.ingest_one("source1").await?;
//!     println!("ingested {count} records");
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod query;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use api::AppState;
pub use error::AppError;
