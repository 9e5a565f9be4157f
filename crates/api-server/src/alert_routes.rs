use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use notification_service::HeadlineAlert;
use serde::{Deserialize, Serialize};

use crate::sentiment_routes::{method_not_allowed, non_blank};
use crate::{AppError, AppState};

const MISSING_FIELDS: &str = "Missing email, headline or sentiment";

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AlertRequest {
    pub email: Option<String>,
    pub headline: Option<String>,
    pub sentiment: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

pub fn alert_routes() -> Router<AppState> {
    Router::new().route("/api/alerts", post(send_alert).fallback(method_not_allowed))
}

#[utoipa::path(
    post,
    path = "/api/alerts",
    request_body = AlertRequest,
    responses(
        (status = 200, description = "Alert e-mail sent", body = MessageResponse),
        (status = 400, description = "Missing fields", body = crate::ErrorBody),
        (status = 500, description = "Delivery failed or no channel configured", body = crate::ErrorBody)
    ),
    tag = "Alerts"
)]
pub(crate) async fn send_alert(
    State(state): State<AppState>,
    payload: Result<Json<AlertRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Rejected alert body: {}", e);
        AppError::bad_request(MISSING_FIELDS)
    })?;

    let (Some(email), Some(headline), Some(sentiment)) =
        (non_blank(req.email), non_blank(req.headline), non_blank(req.sentiment))
    else {
        return Err(AppError::bad_request(MISSING_FIELDS));
    };

    let alert = HeadlineAlert::new(email, headline, sentiment);
    state
        .notifier
        .deliver(&alert)
        .await
        .map_err(|e| AppError::upstream("Email failed", e))?;

    Ok(Json(MessageResponse {
        message: "Email sent".to_string(),
    }))
}
