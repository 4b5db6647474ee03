//! Unified Record query routes
//!
//! - `GET /api/data` - Filtered, paginated records

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use super::queries::{list, ListRecordsError, ListRecordsQuery};
use crate::{api::AppState, error::AppError, query::FilterParams};

pub fn records_routes() -> Router<AppState> {
    Router::new().route("/", get(list_records))
}

/// List records
///
/// # Endpoint
///
/// `GET /api/data?page=1&limit=10&city=par&price_min=60&price_max=120`
///
/// # Query Parameters
///
/// - `page` - Page number (default: 1)
/// - `limit` - Records per page (default: 10, max: 100)
/// - `sourceId`, `id`, `city` - Case-insensitive substring match
/// - `isAvailable` - `true` or `false`
/// - `price` - Exact price
/// - `price_min`, `price_max` - Inclusive price range
///
/// # Response
///
/// - `200 OK` - `{ "data": [...], "meta": { "total", "page", "limit", "pages" } }`
/// - `400 Bad Request` - Unknown field or invalid value
/// - `500 Internal Server Error` - Store failure
#[tracing::instrument(skip(state, params))]
async fn list_records(
    State(state): State<AppState>,
    Query(params): Query<FilterParams>,
) -> Result<Response, AppError> {
    let query = ListRecordsQuery::from_params(params)?;
    let response = list::handle(state.store.clone(), query).await?;

    tracing::debug!(
        count = response.data.len(),
        total = response.meta.total,
        "Records listed via API"
    );

    Ok(Json(response).into_response())
}

impl From<ListRecordsError> for AppError {
    fn from(err: ListRecordsError) -> Self {
        match err {
            ListRecordsError::Query(e) => AppError::Query(e),
            ListRecordsError::Store(e) => AppError::Unidata(e),
        }
    }
}
