use llm_client::{AnalysisBackend, LlmError};
use news_core::{AnnotationState, SentimentReport};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::parse_report;

/// Why a single candidate ticker produced nothing. Logged, never surfaced.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("analysis backend failed: {0}")]
    Transport(#[from] LlmError),

    #[error("no report sections in response for {ticker}")]
    NoSections { ticker: String },

    #[error("model call limiter closed")]
    LimiterClosed,
}

#[derive(Debug, Clone)]
pub struct AnnotatorConfig {
    /// Fixed pause before the first model call of an annotation
    pub pre_request_delay: Duration,
    /// Cap on simultaneous model calls across all annotations
    pub max_concurrent_requests: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            pre_request_delay: Duration::from_millis(1000),
            max_concurrent_requests: 4,
        }
    }
}

impl AnnotatorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            pre_request_delay: std::env::var("SENTIMENT_PRE_REQUEST_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.pre_request_delay),
            max_concurrent_requests: std::env::var("SENTIMENT_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_concurrent_requests),
        }
    }
}

/// Terminal result of one annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOutcome {
    /// The first candidate whose response had at least one section
    Resolved { ticker: String, report: SentimentReport },
    Fallback,
}

impl AnnotationOutcome {
    pub fn report(&self) -> SentimentReport {
        match self {
            AnnotationOutcome::Resolved { report, .. } => report.clone(),
            AnnotationOutcome::Fallback => SentimentReport::fallback(),
        }
    }

    pub fn into_state(self) -> AnnotationState {
        match self {
            AnnotationOutcome::Resolved { report, .. } => AnnotationState::Resolved(report),
            AnnotationOutcome::Fallback => AnnotationState::Fallback(SentimentReport::fallback()),
        }
    }
}

/// Requests and parses sentiment reports, one candidate ticker at a time.
///
/// Model calls from every annotation share one FIFO semaphore. Cancellation
/// is the caller's business: an annotation always runs to completion and the
/// owner decides whether to commit its outcome.
pub struct SentimentAnnotator {
    backend: Arc<dyn AnalysisBackend>,
    permits: Arc<Semaphore>,
    pre_request_delay: Duration,
}

impl SentimentAnnotator {
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: AnnotatorConfig) -> Self {
        Self {
            backend,
            permits: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            pre_request_delay: config.pre_request_delay,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Try `candidates` in order and stop at the first usable report.
    ///
    /// No delay is inserted between candidates.
    pub async fn annotate(&self, title: &str, candidates: &[String]) -> AnnotationOutcome {
        if !self.pre_request_delay.is_zero() {
            tokio::time::sleep(self.pre_request_delay).await;
        }

        for ticker in candidates {
            match self.attempt(title, ticker).await {
                Ok(report) => {
                    tracing::debug!(ticker = %ticker, "Sentiment resolved for {:?}", title);
                    return AnnotationOutcome::Resolved {
                        ticker: ticker.clone(),
                        report,
                    };
                }
                Err(e @ AnnotationError::NoSections { .. }) => {
                    tracing::debug!("Unparseable analysis for {:?}: {}", title, e);
                }
                Err(e) => {
                    tracing::warn!(ticker = %ticker, "Error analyzing sentiment for {:?}: {}", title, e);
                }
            }
        }

        tracing::info!("Using neutral fallback for {:?}", title);
        AnnotationOutcome::Fallback
    }

    async fn attempt(&self, title: &str, ticker: &str) -> Result<SentimentReport, AnnotationError> {
        let analysis = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| AnnotationError::LimiterClosed)?;
            self.backend.analyze(title, ticker).await?
        };

        let report = parse_report(&analysis);
        if report.has_any_section() {
            Ok(report)
        } else {
            Err(AnnotationError::NoSections {
                ticker: ticker.to_string(),
            })
        }
    }
}
