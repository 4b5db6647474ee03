pub mod commands;
pub mod routes;

pub use commands::{IngestAllResponse, IngestSourceCommand, IngestSourceResponse};
pub use routes::ingestion_routes;
