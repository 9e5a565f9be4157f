//! Per-session orchestration: news, portfolio, tagging and annotations.

mod feed;

pub use feed::{Feed, FeedEntry};

use news_core::{AnnotationKey, AnnotationState, Headline, NewsError, Portfolio, TaggedHeadline};
use news_sources::NewsAggregator;
use sentiment_analysis::SentimentAnnotator;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use ticker_matcher::{tag_headlines, TickerSynonymMap};
use tokio::sync::RwLock;
use tokio_util::sync::{CancellationToken, DropGuard};

#[derive(Default)]
struct PipelineState {
    news: Vec<Headline>,
    portfolio: Portfolio,
    tagged: Vec<TaggedHeadline>,
    /// Absent key means Idle
    annotations: HashMap<AnnotationKey, AnnotationState>,
    /// One guard per Pending key; dropping it cancels the task
    guards: HashMap<AnnotationKey, DropGuard>,
}

/// One user's view of the news: the latest headlines, the portfolio, and
/// the annotations derived from both.
///
/// Every mutation recomputes the tagged collection. New (headline, tickers)
/// pairs get exactly one annotation task; pairs that disappear while still
/// pending are cancelled and return to Idle. Finished annotations are kept
/// for the lifetime of the pipeline.
pub struct NewsPipeline {
    aggregator: Arc<NewsAggregator>,
    synonyms: Arc<TickerSynonymMap>,
    annotator: Arc<SentimentAnnotator>,
    state: Arc<RwLock<PipelineState>>,
}

impl NewsPipeline {
    pub fn new(
        aggregator: Arc<NewsAggregator>,
        synonyms: Arc<TickerSynonymMap>,
        annotator: Arc<SentimentAnnotator>,
    ) -> Self {
        Self {
            aggregator,
            synonyms,
            annotator,
            state: Arc::new(RwLock::new(PipelineState::default())),
        }
    }

    /// Replace the news with a fresh aggregation.
    ///
    /// On failure the previous news and everything derived from it stay as
    /// they were.
    pub async fn refresh_news(&self) -> Result<usize, NewsError> {
        let headlines = self.aggregator.fetch_all().await?;

        let mut state = self.state.write().await;
        state.news = headlines;
        self.recompute(&mut state);
        Ok(state.news.len())
    }

    /// Returns false when the ticker was already held.
    pub async fn add_ticker(&self, raw: &str) -> Result<bool, NewsError> {
        let mut state = self.state.write().await;
        let added = state.portfolio.insert(raw)?;
        if added {
            tracing::info!("Added {} to portfolio", raw.trim().to_uppercase());
            self.recompute(&mut state);
        }
        Ok(added)
    }

    pub async fn remove_ticker(&self, raw: &str) -> bool {
        let mut state = self.state.write().await;
        let removed = state.portfolio.remove(raw);
        if removed {
            tracing::info!("Removed {} from portfolio", raw.trim().to_uppercase());
            self.recompute(&mut state);
        }
        removed
    }

    pub async fn portfolio(&self) -> Portfolio {
        self.state.read().await.portfolio.clone()
    }

    pub async fn news(&self) -> Vec<Headline> {
        self.state.read().await.news.clone()
    }

    pub async fn tagged_headlines(&self) -> Vec<TaggedHeadline> {
        self.state.read().await.tagged.clone()
    }

    pub async fn annotation_state(&self, key: &AnnotationKey) -> AnnotationState {
        self.state
            .read()
            .await
            .annotations
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn feed(&self) -> Feed {
        let state = self.state.read().await;
        let headlines = state
            .tagged
            .iter()
            .map(|tagged| {
                let annotation = state.annotations.get(&tagged.key()).cloned().unwrap_or_default();
                FeedEntry::new(tagged.clone(), &annotation)
            })
            .collect();

        Feed {
            portfolio: state.portfolio.tickers().to_vec(),
            headlines,
        }
    }

    /// Cancel every pending annotation. Finished ones are kept.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        let pending = state.guards.len();
        state.guards.clear();
        state.annotations.retain(|_, annotation| annotation.is_terminal());
        if pending > 0 {
            tracing::info!("Cancelled {} pending annotations", pending);
        }
    }

    fn recompute(&self, state: &mut PipelineState) {
        let tagged = tag_headlines(&state.news, &state.portfolio, &self.synonyms);
        let live: HashSet<AnnotationKey> = tagged.iter().map(TaggedHeadline::key).collect();

        let before = state.guards.len();
        state.guards.retain(|key, _| live.contains(key));
        let cancelled = before - state.guards.len();
        if cancelled > 0 {
            tracing::debug!("Cancelled {} stale annotations", cancelled);
        }
        state
            .annotations
            .retain(|key, annotation| live.contains(key) || annotation.is_terminal());

        for item in &tagged {
            let key = item.key();
            if state.annotations.contains_key(&key) {
                continue;
            }
            state.annotations.insert(key.clone(), AnnotationState::Pending);
            let guard = self.spawn_annotation(key.clone(), item.headline.title.clone());
            state.guards.insert(key, guard);
        }

        tracing::debug!(
            "{} of {} headlines tagged for {} tickers",
            tagged.len(),
            state.news.len(),
            state.portfolio.len()
        );
        state.tagged = tagged;
    }

    fn spawn_annotation(&self, key: AnnotationKey, title: String) -> DropGuard {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let annotator = Arc::clone(&self.annotator);
        let state: Weak<RwLock<PipelineState>> = Arc::downgrade(&self.state);

        tokio::spawn(async move {
            let outcome = annotator.annotate(&title, &key.matched_stocks).await;

            let Some(state) = state.upgrade() else {
                return;
            };
            let mut state = state.write().await;
            if cancelled.is_cancelled() {
                tracing::debug!("Discarding cancelled annotation for {}", key.link);
                return;
            }
            state.guards.remove(&key);
            state.annotations.insert(key, outcome.into_state());
        });

        token.drop_guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use llm_client::{AnalysisBackend, LlmError, LlmResult};
    use news_core::SentimentReport;
    use news_sources::{DocumentFetcher, HeadlineSource, SourceError};
    use sentiment_analysis::AnnotatorConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Semaphore;

    const REPORT: &str = "1. Summary: Lender beats estimates 2. Advice: Buy 3. Outlook: Bullish 4. Sentiment: Positive";

    struct NoFetch;

    #[async_trait]
    impl DocumentFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<String, SourceError> {
            Err(SourceError::Transport(format!("offline: {url}")))
        }
    }

    /// Serves whatever the test last put in the slot; an empty slot fails.
    struct SlotSource {
        slot: Arc<Mutex<Vec<Headline>>>,
    }

    #[async_trait]
    impl HeadlineSource for SlotSource {
        fn name(&self) -> &str {
            "slot"
        }

        async fn try_fetch(&self, _fetcher: &dyn DocumentFetcher) -> Result<Vec<Headline>, SourceError> {
            let headlines = self.slot.lock().unwrap().clone();
            if headlines.is_empty() {
                Err(SourceError::Status { status: 503, url: "https://slot.test".to_string() })
            } else {
                Ok(headlines)
            }
        }
    }

    /// Blocks every call until the test opens the gate.
    struct GatedBackend {
        gate: Semaphore,
        calls: AtomicUsize,
    }

    impl GatedBackend {
        fn closed() -> Arc<Self> {
            Arc::new(Self { gate: Semaphore::new(0), calls: AtomicUsize::new(0) })
        }

        fn open() -> Arc<Self> {
            let backend = Self::closed();
            backend.release();
            backend
        }

        fn release(&self) {
            self.gate.add_permits(1000);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalysisBackend for GatedBackend {
        async fn analyze(&self, _headline: &str, _ticker: &str) -> LlmResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _pass = self
                .gate
                .acquire()
                .await
                .map_err(|_| LlmError::ServiceUnavailable("gate closed".to_string()))?;
            Ok(REPORT.to_string())
        }

        fn backend_name(&self) -> &'static str {
            "gated"
        }
    }

    fn headlines() -> Vec<Headline> {
        vec![
            Headline::new("PNB shares jump after Q4 results", "https://news.test/pnb"),
            Headline::new("Monsoon arrives early in Kerala", "https://news.test/monsoon"),
            Headline::new("Sensex ends flat as IT stocks drag", "https://news.test/sensex"),
        ]
    }

    fn pipeline(backend: Arc<GatedBackend>) -> (NewsPipeline, Arc<Mutex<Vec<Headline>>>) {
        let slot = Arc::new(Mutex::new(headlines()));
        let aggregator = NewsAggregator::new(
            vec![Box::new(SlotSource { slot: Arc::clone(&slot) })],
            Arc::new(NoFetch),
        );
        let annotator = SentimentAnnotator::new(
            backend,
            AnnotatorConfig { pre_request_delay: Duration::ZERO, max_concurrent_requests: 4 },
        );
        let pipeline = NewsPipeline::new(
            Arc::new(aggregator),
            Arc::new(TickerSynonymMap::builtin()),
            Arc::new(annotator),
        );
        (pipeline, slot)
    }

    fn pnb_key() -> AnnotationKey {
        AnnotationKey {
            link: "https://news.test/pnb".to_string(),
            matched_stocks: vec!["PNB".to_string()],
        }
    }

    async fn wait_terminal(pipeline: &NewsPipeline, key: &AnnotationKey) -> AnnotationState {
        for _ in 0..200 {
            let state = pipeline.annotation_state(key).await;
            if state.is_terminal() {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("annotation for {} never finished", key.link);
    }

    async fn wait_calls(backend: &GatedBackend, expected: usize) {
        for _ in 0..200 {
            if backend.calls() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("backend saw {} calls, expected {}", backend.calls(), expected);
    }

    #[tokio::test]
    async fn test_portfolio_tags_and_resolves() {
        let backend = GatedBackend::open();
        let (pipeline, _slot) = pipeline(backend.clone());

        assert_eq!(pipeline.refresh_news().await.unwrap(), 3);
        assert!(pipeline.tagged_headlines().await.is_empty());

        assert!(pipeline.add_ticker(" pnb ").await.unwrap());
        let tagged = pipeline.tagged_headlines().await;
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].matched_stocks, vec!["PNB"]);

        let state = wait_terminal(&pipeline, &pnb_key()).await;
        match state {
            AnnotationState::Resolved(report) => {
                assert_eq!(report.summary.as_deref(), Some("Lender beats estimates"));
                assert_eq!(report.sentiment.as_deref(), Some("Positive"));
            }
            other => panic!("unexpected state {other:?}"),
        }

        let feed = pipeline.feed().await;
        assert_eq!(feed.portfolio, vec!["PNB"]);
        assert_eq!(feed.headlines[0].status, "resolved");
        assert_eq!(feed.headlines[0].label, Some(news_core::SentimentLabel::Positive));
    }

    #[tokio::test]
    async fn test_annotation_is_spawned_once_per_key() {
        let backend = GatedBackend::closed();
        let (pipeline, _slot) = pipeline(backend.clone());

        pipeline.refresh_news().await.unwrap();
        pipeline.add_ticker("PNB").await.unwrap();
        wait_calls(&backend, 1).await;

        // Unrelated ticker and a second refresh leave the PNB pair untouched
        pipeline.add_ticker("WIPRO").await.unwrap();
        pipeline.refresh_news().await.unwrap();
        assert_eq!(pipeline.annotation_state(&pnb_key()).await, AnnotationState::Pending);

        backend.release();
        wait_terminal(&pipeline, &pnb_key()).await;
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_removed_pair_is_cancelled_and_never_committed() {
        let backend = GatedBackend::closed();
        let (pipeline, _slot) = pipeline(backend.clone());

        pipeline.refresh_news().await.unwrap();
        pipeline.add_ticker("PNB").await.unwrap();
        wait_calls(&backend, 1).await;

        assert!(pipeline.remove_ticker("pnb").await);
        assert_eq!(pipeline.annotation_state(&pnb_key()).await, AnnotationState::Idle);

        backend.release();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(pipeline.annotation_state(&pnb_key()).await, AnnotationState::Idle);

        // Coming back is a new pair and gets a fresh task
        pipeline.add_ticker("PNB").await.unwrap();
        wait_terminal(&pipeline, &pnb_key()).await;
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_terminal_state_survives_removal() {
        let backend = GatedBackend::open();
        let (pipeline, _slot) = pipeline(backend.clone());

        pipeline.refresh_news().await.unwrap();
        pipeline.add_ticker("PNB").await.unwrap();
        let resolved = wait_terminal(&pipeline, &pnb_key()).await;

        pipeline.remove_ticker("PNB").await;
        assert!(pipeline.tagged_headlines().await.is_empty());
        assert_eq!(pipeline.annotation_state(&pnb_key()).await, resolved);

        pipeline.add_ticker("PNB").await.unwrap();
        assert_eq!(pipeline.annotation_state(&pnb_key()).await, resolved);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_news() {
        let backend = GatedBackend::open();
        let (pipeline, slot) = pipeline(backend);

        pipeline.refresh_news().await.unwrap();
        pipeline.add_ticker("SENSEX").await.unwrap();

        slot.lock().unwrap().clear();
        let err = pipeline.refresh_news().await.unwrap_err();
        assert_eq!(err, NewsError::NoHeadlinesAvailable);
        assert_eq!(pipeline.news().await.len(), 3);
        assert_eq!(pipeline.tagged_headlines().await.len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_and_keeps_finished() {
        let backend = GatedBackend::closed();
        let (pipeline, _slot) = pipeline(backend.clone());
        let sensex_key = AnnotationKey {
            link: "https://news.test/sensex".to_string(),
            matched_stocks: vec!["SENSEX".to_string()],
        };

        pipeline.refresh_news().await.unwrap();
        pipeline.add_ticker("PNB").await.unwrap();
        backend.release();
        wait_terminal(&pipeline, &pnb_key()).await;

        let backend_calls = backend.calls();
        backend.gate.forget_permits(usize::MAX);
        pipeline.add_ticker("SENSEX").await.unwrap();
        wait_calls(&backend, backend_calls + 1).await;

        pipeline.shutdown().await;
        backend.release();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(pipeline.annotation_state(&pnb_key()).await.is_terminal());
        assert_eq!(pipeline.annotation_state(&sensex_key).await, AnnotationState::Idle);
    }

    #[tokio::test]
    async fn test_fallback_when_backend_fails() {
        struct Down;

        #[async_trait]
        impl AnalysisBackend for Down {
            async fn analyze(&self, _headline: &str, _ticker: &str) -> LlmResult<String> {
                Err(LlmError::MissingApiKey)
            }

            fn backend_name(&self) -> &'static str {
                "down"
            }
        }

        let aggregator = NewsAggregator::new(
            vec![Box::new(SlotSource { slot: Arc::new(Mutex::new(headlines())) })],
            Arc::new(NoFetch),
        );
        let annotator = SentimentAnnotator::new(
            Arc::new(Down),
            AnnotatorConfig { pre_request_delay: Duration::ZERO, max_concurrent_requests: 1 },
        );
        let pipeline = NewsPipeline::new(
            Arc::new(aggregator),
            Arc::new(TickerSynonymMap::builtin()),
            Arc::new(annotator),
        );

        pipeline.refresh_news().await.unwrap();
        pipeline.add_ticker("PNB").await.unwrap();

        let state = wait_terminal(&pipeline, &pnb_key()).await;
        assert_eq!(state, AnnotationState::Fallback(SentimentReport::fallback()));
    }
}
