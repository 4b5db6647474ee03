//! Data ingestion pipeline
//!
//! - [`registry`]: the catalog of sources and how each is fetched
//! - [`fetcher`]: object storage first, plain HTTP as fallback
//! - [`decoder`]: whole-body and streaming JSON array decoding
//! - [`transform`]: per-source mapping into Unified Records
//! - [`upsert`]: idempotent writes keyed by `(source_id, id)`
//! - [`orchestrator`]: runs the pipeline per source
//! - [`scheduler`]: optional periodic re-ingestion

pub mod config;
pub mod decoder;
pub mod fetcher;
pub mod orchestrator;
pub mod registry;
pub mod scheduler;
pub mod transform;
pub mod upsert;

pub use config::IngestConfig;
pub use fetcher::{Fetcher, ObjectLocation, ObjectTransport};
pub use orchestrator::{IngestOrchestrator, RunStats};
pub use registry::{FetchMode, SourceDescriptor, SourceRegistry};
pub use scheduler::IngestScheduler;
pub use upsert::Upserter;
