//! Session Routes
//!
//! Each session owns one news pipeline: its own headlines, portfolio and
//! annotation states. Closing a session cancels its pending annotations.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use news_pipeline::Feed;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{ApiResponse, AppError, AppState};

#[derive(Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
}

#[derive(Serialize)]
pub struct RefreshSummary {
    pub headlines: usize,
    pub tagged: usize,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddTickerRequest {
    pub ticker: String,
}

#[derive(Serialize)]
pub struct PortfolioChange {
    pub tickers: Vec<String>,
    /// False when the request left the portfolio as it was
    pub changed: bool,
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", delete(close_session))
        .route("/api/sessions/:id/refresh", post(refresh_session))
        .route("/api/sessions/:id/portfolio", post(add_ticker))
        .route("/api/sessions/:id/portfolio/:ticker", delete(remove_ticker))
        .route("/api/sessions/:id/feed", get(get_feed))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Session created; the first news refresh runs in the background"),
        (status = 503, description = "Session limit reached", body = crate::ErrorBody)
    ),
    tag = "Sessions"
)]
pub(crate) async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let pipeline = Arc::new(state.new_pipeline());
    let session_id = state
        .sessions
        .open(Arc::clone(&pipeline))
        .ok_or_else(|| AppError::unavailable("Too many open sessions, try again later"))?;
    tracing::info!("Session {} opened ({} active)", session_id, state.sessions.len());

    tokio::spawn(async move {
        if let Err(e) = pipeline.refresh_news().await {
            tracing::warn!("Initial refresh for session {} failed: {}", session_id, e);
        }
    });

    Ok(Json(ApiResponse::success(SessionInfo { session_id })))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session closed"),
        (status = 404, description = "Unknown or expired session", body = crate::ErrorBody)
    ),
    tag = "Sessions"
)]
pub(crate) async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let pipeline = state
        .sessions
        .remove(&id)
        .ok_or_else(|| AppError::not_found(format!("Session {} not found", id)))?;

    pipeline.shutdown().await;
    tracing::info!("Session {} closed", id);

    Ok(Json(ApiResponse::success(SessionInfo { session_id: id })))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/refresh",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "News replaced and re-tagged"),
        (status = 404, description = "Unknown session", body = crate::ErrorBody),
        (status = 500, description = "No source produced a headline; previous news kept", body = crate::ErrorBody)
    ),
    tag = "Sessions"
)]
pub(crate) async fn refresh_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RefreshSummary>>, AppError> {
    let pipeline = state.session(id)?;
    let headlines = pipeline.refresh_news().await?;
    let tagged = pipeline.tagged_headlines().await.len();

    Ok(Json(ApiResponse::success(RefreshSummary { headlines, tagged })))
}

#[utoipa::path(
    post,
    path = "/api/sessions/{id}/portfolio",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = AddTickerRequest,
    responses(
        (status = 200, description = "Ticker held"),
        (status = 400, description = "Blank ticker", body = crate::ErrorBody),
        (status = 404, description = "Unknown session", body = crate::ErrorBody)
    ),
    tag = "Sessions"
)]
pub(crate) async fn add_ticker(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<AddTickerRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<PortfolioChange>>, AppError> {
    let pipeline = state.session(id)?;
    let Json(req) = payload.map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))?;

    let changed = pipeline.add_ticker(&req.ticker).await?;
    let tickers = pipeline.portfolio().await.tickers().to_vec();

    Ok(Json(ApiResponse::success(PortfolioChange { tickers, changed })))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}/portfolio/{ticker}",
    params(
        ("id" = Uuid, Path, description = "Session id"),
        ("ticker" = String, Path, description = "Ticker symbol, any case")
    ),
    responses(
        (status = 200, description = "Ticker no longer held"),
        (status = 404, description = "Unknown session", body = crate::ErrorBody)
    ),
    tag = "Sessions"
)]
pub(crate) async fn remove_ticker(
    State(state): State<AppState>,
    Path((id, ticker)): Path<(Uuid, String)>,
) -> Result<Json<ApiResponse<PortfolioChange>>, AppError> {
    let pipeline = state.session(id)?;
    let changed = pipeline.remove_ticker(&ticker).await;
    let tickers = pipeline.portfolio().await.tickers().to_vec();

    Ok(Json(ApiResponse::success(PortfolioChange { tickers, changed })))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{id}/feed",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Portfolio and tagged headlines with annotation status"),
        (status = 404, description = "Unknown session", body = crate::ErrorBody)
    ),
    tag = "Sessions"
)]
pub(crate) async fn get_feed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Feed>>, AppError> {
    let pipeline = state.session(id)?;
    Ok(Json(ApiResponse::success(pipeline.feed().await)))
}
