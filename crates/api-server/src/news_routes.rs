use axum::{extract::State, routing::get, Json, Router};
use news_core::Headline;
use serde::Serialize;

use crate::{AppError, AppState};

#[derive(Serialize, utoipa::ToSchema)]
pub struct NewsResponse {
    pub headlines: Vec<Headline>,
}

pub fn news_routes() -> Router<AppState> {
    Router::new().route("/api/news", get(get_news))
}

#[utoipa::path(
    get,
    path = "/api/news",
    responses(
        (status = 200, description = "Headlines from every source that answered", body = NewsResponse),
        (status = 500, description = "No source produced a headline", body = crate::ErrorBody)
    ),
    tag = "News"
)]
pub(crate) async fn get_news(State(state): State<AppState>) -> Result<Json<NewsResponse>, AppError> {
    let headlines = state.aggregator.fetch_all().await?;
    Ok(Json(NewsResponse { headlines }))
}
