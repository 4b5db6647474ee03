//! Source registry routes

use axum::{extract::State, routing::get, Router};

use super::queries::list;
use crate::api::{response::ApiResponse, AppState};
use crate::ingest::SourceDescriptor;

pub fn sources_routes() -> Router<AppState> {
    Router::new().route("/", get(list_sources))
}

/// `GET /api/sources` - `{ "success": true, "data": [{ id, name, url, ingestInterval, fetchMode }] }`
async fn list_sources(State(state): State<AppState>) -> ApiResponse<Vec<SourceDescriptor>> {
    ApiResponse::success(list::handle(state.orchestrator.registry()))
}
