use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::Recommendation,
    routes::{AppState, HistoryRequest},
    services::{export, StaticHistory},
};

async fn run(
    state: &AppState,
    request_id: &RequestId,
    request: HistoryRequest,
) -> AppResult<Vec<Recommendation>> {
    tracing::info!(
        request_id = %request_id,
        record_count = request.history.len(),
        "Processing recommendation request"
    );

    request.validate()?;

    let history = StaticHistory::new(request.history);
    let recommendations = state.recommender.recommend(&history).await?;

    tracing::info!(
        request_id = %request_id,
        count = recommendations.len(),
        "Recommendation request completed"
    );

    Ok(recommendations)
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<HistoryRequest>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let recommendations = run(&state, &request_id, request).await?;
    Ok(Json(recommendations))
}

/// Same recommendations as CSV (`title,score`)
pub async fn export(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<HistoryRequest>,
) -> AppResult<impl IntoResponse> {
    let recommendations = run(&state, &request_id, request).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        export::to_csv(&recommendations),
    ))
}
