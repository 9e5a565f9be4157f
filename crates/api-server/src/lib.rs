//! HTTP surface of the news desk: headlines, one-shot sentiment analysis,
//! e-mail alerts and per-user pipeline sessions.

mod alert_routes;
mod news_routes;
mod request_id;
mod sentiment_routes;
mod session_routes;
mod sessions;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use llm_client::{AnalysisBackend, LlmConfig, OpenAiClient, RemoteAnalysisClient};
use news_core::NewsError;
use news_pipeline::NewsPipeline;
use news_sources::NewsAggregator;
use notification_service::{NotificationConfig, NotificationService};
use sentiment_analysis::{AnnotatorConfig, SentimentAnnotator};
use serde::Serialize;
use std::sync::Arc;
use ticker_matcher::TickerSynonymMap;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::request_id::request_id_middleware;

pub use sessions::{SessionConfig, SessionRegistry};

/// Envelope used by the session endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Error body: `{ "error": ..., "details"?: ... }`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Handler error carrying its HTTP status.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl AppError {
    pub fn with_status(status: StatusCode, err: anyhow::Error) -> Self {
        Self {
            status,
            message: err.to_string(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
            details: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: message.into(),
            details: None,
        }
    }

    pub fn method_not_allowed() -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: "Method not allowed".to_string(),
            details: None,
        }
    }

    /// A dependency failed; `message` is the public summary, the cause goes
    /// into `details`.
    pub fn upstream(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            details: Some(cause.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err)
    }
}

impl From<NewsError> for AppError {
    fn from(err: NewsError) -> Self {
        match err {
            NewsError::NoHeadlinesAvailable => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.to_string(),
                details: None,
            },
            NewsError::InvalidTicker(_) => Self::bad_request(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                "{} {}{}",
                self.status.as_u16(),
                self.message,
                self.details.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
            );
        }

        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                details: self.details,
            }),
        )
            .into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<NewsAggregator>,
    /// Answers `/api/sentiment/analyze`
    pub analysis: Arc<dyn AnalysisBackend>,
    /// Shared by every session, so the model-call cap is global
    pub annotator: Arc<SentimentAnnotator>,
    pub synonyms: Arc<TickerSynonymMap>,
    pub notifier: Arc<NotificationService>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        aggregator: NewsAggregator,
        analysis: Arc<dyn AnalysisBackend>,
        annotator: SentimentAnnotator,
        synonyms: TickerSynonymMap,
        notifier: NotificationService,
    ) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            analysis,
            annotator: Arc::new(annotator),
            synonyms: Arc::new(synonyms),
            notifier: Arc::new(notifier),
            sessions: Arc::new(SessionRegistry::new(SessionConfig::default())),
        }
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.sessions = Arc::new(SessionRegistry::new(config));
        self
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let llm_config = LlmConfig::from_env();
        let timeout = llm_config.timeout;
        let openai = OpenAiClient::new(llm_config)?;
        tracing::info!(
            "OpenAI key present: {} (model {})",
            openai.has_api_key(),
            openai.model()
        );
        let openai: Arc<dyn AnalysisBackend> = Arc::new(openai);

        let annotation_backend: Arc<dyn AnalysisBackend> =
            match std::env::var("SENTIMENT_ENDPOINT_URL").ok().filter(|s| !s.is_empty()) {
                Some(url) => {
                    let remote = RemoteAnalysisClient::new(url, timeout)?;
                    tracing::info!("Session annotations use remote endpoint {}", remote.endpoint());
                    Arc::new(remote)
                }
                None => Arc::clone(&openai),
            };

        let aggregator = NewsAggregator::with_defaults();
        tracing::info!("News sources: {}", aggregator.source_names().join(", "));

        Ok(Self::new(
            aggregator,
            openai,
            SentimentAnnotator::new(annotation_backend, AnnotatorConfig::from_env()),
            TickerSynonymMap::from_env(),
            NotificationService::new(&NotificationConfig::from_env()),
        )
        .with_session_config(SessionConfig::from_env()))
    }

    pub fn new_pipeline(&self) -> NewsPipeline {
        NewsPipeline::new(
            Arc::clone(&self.aggregator),
            Arc::clone(&self.synonyms),
            Arc::clone(&self.annotator),
        )
    }

    pub fn session(&self, id: Uuid) -> Result<Arc<NewsPipeline>, AppError> {
        self.sessions
            .get(&id)
            .ok_or_else(|| AppError::not_found(format!("Session {} not found", id)))
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Newsdesk API", description = "Market headlines, sentiment reports and alerts"),
    paths(
        health,
        news_routes::get_news,
        sentiment_routes::analyze_sentiment,
        alert_routes::send_alert,
        session_routes::create_session,
        session_routes::close_session,
        session_routes::refresh_session,
        session_routes::add_ticker,
        session_routes::remove_ticker,
        session_routes::get_feed,
    ),
    components(schemas(
        ErrorBody,
        news_core::Headline,
        news_routes::NewsResponse,
        sentiment_routes::AnalyzeRequest,
        sentiment_routes::AnalyzeResponse,
        alert_routes::AlertRequest,
        alert_routes::MessageResponse,
        session_routes::AddTickerRequest,
    )),
    tags(
        (name = "News", description = "Headline aggregation"),
        (name = "Sentiment", description = "Model-backed headline analysis"),
        (name = "Alerts", description = "E-mail notifications"),
        (name = "Sessions", description = "Portfolio-driven news pipelines"),
    )
)]
pub struct ApiDoc;

#[utoipa::path(get, path = "/health", responses((status = 200, description = "Service is up")), tag = "News")]
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn build_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/openapi.json", get(openapi_json))
        .merge(news_routes::news_routes())
        .merge(sentiment_routes::sentiment_routes())
        .merge(alert_routes::alert_routes())
        .merge(session_routes::session_routes())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("API_BIND_ADDR")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Self::default().bind_addr),
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if matches!(std::env::var("RUST_LOG_FORMAT").as_deref(), Ok("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Starting Newsdesk API server");

    let config = ServerConfig::from_env();
    let state = AppState::from_env()?;
    let sessions = Arc::clone(&state.sessions);
    let sweeper = sessions.spawn_sweeper();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    for pipeline in sessions.drain() {
        pipeline.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}
