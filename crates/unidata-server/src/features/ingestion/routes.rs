//! Ingestion trigger routes
//!
//! - `POST /api/ingest` - Ingest every registered source
//! - `POST /api/ingest/:source_id` - Ingest one source
//!
//! Runs are synchronous: the response is sent once the run has finished.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{ingest_all, ingest_source, IngestSourceCommand};
use crate::{api::AppState, error::AppError};

pub fn ingestion_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest_all_sources))
        .route("/:source_id", post(ingest_one_source))
}

/// Ingest a single source
///
/// # Endpoint
///
/// `POST /api/ingest/:source_id`
///
/// # Response
///
/// - `200 OK` - `{ "success": true, "sourceId": "source1", "count": 42 }`
/// - `404 Not Found` - No source registered under that id
/// - `500 Internal Server Error` - Fetch, parse, transform or persistence failure
#[tracing::instrument(skip(state))]
async fn ingest_one_source(
    State(state): State<AppState>,
    Path(source_id): Path<String>,
) -> Result<Response, AppError> {
    let command = IngestSourceCommand { source_id };
    let response = ingest_source::handle(&state.orchestrator, command).await?;

    Ok(Json(response).into_response())
}

/// Ingest every registered source in registry order
///
/// # Endpoint
///
/// `POST /api/ingest`
///
/// # Response
///
/// - `200 OK` - `{ "success": true, "results": { "source1": 3, "source2": 0 }, "totalCount": 3 }`
#[tracing::instrument(skip(state))]
async fn ingest_all_sources(State(state): State<AppState>) -> Response {
    Json(ingest_all::handle(&state.orchestrator).await).into_response()
}
