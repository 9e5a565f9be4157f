use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};

const MISSING_FIELDS: &str = "Missing headline or ticker";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AnalyzeRequest {
    pub headline: Option<String>,
    pub ticker: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

pub fn sentiment_routes() -> Router<AppState> {
    Router::new().route(
        "/api/sentiment/analyze",
        post(analyze_sentiment).fallback(method_not_allowed),
    )
}

pub(crate) async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[utoipa::path(
    post,
    path = "/api/sentiment/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Free-text four-section analysis", body = AnalyzeResponse),
        (status = 400, description = "Missing headline or ticker", body = crate::ErrorBody),
        (status = 405, description = "Only POST is accepted", body = crate::ErrorBody),
        (status = 500, description = "Model call failed", body = crate::ErrorBody)
    ),
    tag = "Sentiment"
)]
pub(crate) async fn analyze_sentiment(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Rejected analyze body: {}", e);
        AppError::bad_request(MISSING_FIELDS)
    })?;

    let (Some(headline), Some(ticker)) = (non_blank(req.headline), non_blank(req.ticker)) else {
        return Err(AppError::bad_request(MISSING_FIELDS));
    };

    let analysis = state
        .analysis
        .analyze(&headline, &ticker)
        .await
        .map_err(|e| AppError::upstream("Failed to analyze sentiment", e))?;

    Ok(Json(AnalyzeResponse { analysis }))
}
