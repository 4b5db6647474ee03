//! Feature slices implementing the unidata API
//!
//! Each feature is a vertical slice with its own `commands/` (write
//! operations) or `queries/` (read operations) and a `routes.rs` that wires
//! them to Axum handlers.
//!
//! - **records**: filtered, paginated Unified Record queries
//! - **ingestion**: on-demand ingestion runs
//! - **sources**: registry listing

pub mod ingestion;
pub mod records;
pub mod sources;

use axum::Router;

use crate::api::AppState;

/// Creates the API router with every feature mounted under its own prefix:
///
/// - `/data` - Unified Record queries
/// - `/ingest` - Ingestion triggers
/// - `/sources` - Registered sources
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/data", records::records_routes())
        .nest("/ingest", ingestion::ingestion_routes())
        .nest("/sources", sources::sources_routes())
}
