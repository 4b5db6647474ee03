pub mod response;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use crate::{
    config::CorsConfig, features, ingest::IngestOrchestrator, middleware, store::RecordStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub orchestrator: Arc<IngestOrchestrator>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, orchestrator: Arc<IngestOrchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }
}

/// Routes without the middleware stack
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", features::router())
        .with_state(state)
}

/// The full application: routes plus compression, request tracing and CORS
pub fn app(state: AppState, cors: &CorsConfig) -> Router {
    router(state)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors))
}

async fn health(State(state): State<AppState>) -> Response {
    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "store": "connected"
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "store": "unreachable"
                })),
            )
                .into_response()
        },
    }
}
