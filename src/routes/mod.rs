use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::{make_span_with_request_id, request_id_middleware},
    models::HistoryRecord,
    services::Recommender,
};

/// Largest history accepted in one request body
pub const MAX_HISTORY_RECORDS: usize = 5000;

pub mod recommendations;
pub mod signals;

/// Shared application state
pub struct AppState {
    pub recommender: Recommender,
}

/// Body of every history-driven endpoint
#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub history: Vec<HistoryRecord>,
}

impl HistoryRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.history.len() > MAX_HISTORY_RECORDS {
            return Err(AppError::InvalidInput(format!(
                "history has {} records, at most {} are accepted",
                self.history.len(),
                MAX_HISTORY_RECORDS
            )));
        }
        Ok(())
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signals", post(signals::classify))
        .route("/recommendations", post(recommendations::recommend))
        .route("/recommendations/export", post(recommendations::export))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
