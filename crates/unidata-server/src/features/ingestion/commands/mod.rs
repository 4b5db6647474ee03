pub mod ingest_all;
pub mod ingest_source;

pub use ingest_all::IngestAllResponse;
pub use ingest_source::{IngestSourceCommand, IngestSourceResponse};
