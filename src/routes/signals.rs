use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::Signal,
    routes::{AppState, HistoryRequest},
    services::StaticHistory,
};

/// Handler for the history classification endpoint
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<HistoryRequest>,
) -> AppResult<Json<Vec<Signal>>> {
    tracing::info!(
        request_id = %request_id,
        record_count = request.history.len(),
        "Classifying browsing history"
    );

    request.validate()?;

    let history = StaticHistory::new(request.history);
    let signals = state.recommender.signals(&history).await?;

    Ok(Json(signals))
}
