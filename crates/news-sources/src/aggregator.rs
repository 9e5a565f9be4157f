use futures_util::future::join_all;
use news_core::{Headline, NewsError};
use std::sync::Arc;

use crate::{default_sources, DocumentFetcher, HeadlineSource, HttpFetcher};

/// Fans out over every source and concatenates what comes back.
pub struct NewsAggregator {
    sources: Vec<Box<dyn HeadlineSource>>,
    fetcher: Arc<dyn DocumentFetcher>,
}

impl NewsAggregator {
    pub fn new(sources: Vec<Box<dyn HeadlineSource>>, fetcher: Arc<dyn DocumentFetcher>) -> Self {
        Self { sources, fetcher }
    }

    /// Default sources over the reqwest fetcher.
    pub fn with_defaults() -> Self {
        Self::new(default_sources(), Arc::new(HttpFetcher::from_env()))
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Run all sources concurrently and wait for every one of them.
    ///
    /// Output keeps source declaration order. Fails only when no source
    /// produced a single headline.
    pub async fn fetch_all(&self) -> Result<Vec<Headline>, NewsError> {
        let fetcher = self.fetcher.as_ref();
        let results = join_all(self.sources.iter().map(|source| source.fetch(fetcher))).await;

        let headlines: Vec<Headline> = results.into_iter().flatten().collect();

        if headlines.is_empty() {
            tracing::warn!("No headlines fetched from any of {} sources", self.sources.len());
            return Err(NewsError::NoHeadlinesAvailable);
        }

        tracing::info!(
            "Aggregated {} headlines from {} sources",
            headlines.len(),
            self.sources.len()
        );
        Ok(headlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullFetcher;

    #[async_trait]
    impl DocumentFetcher for NullFetcher {
        async fn fetch(&self, url: &str) -> Result<String, SourceError> {
            Err(SourceError::Transport(format!("offline: {url}")))
        }
    }

    struct CannedSource {
        name: String,
        headlines: Option<Vec<Headline>>,
        calls: Arc<AtomicUsize>,
    }

    impl CannedSource {
        fn ok(name: &str, count: usize, calls: &Arc<AtomicUsize>) -> Box<dyn HeadlineSource> {
            let headlines = (0..count)
                .map(|i| Headline::new(format!("{name} story {i}"), format!("https://{name}.test/{i}")))
                .collect();
            Box::new(Self {
                name: name.to_string(),
                headlines: Some(headlines),
                calls: Arc::clone(calls),
            })
        }

        fn failing(name: &str, calls: &Arc<AtomicUsize>) -> Box<dyn HeadlineSource> {
            Box::new(Self {
                name: name.to_string(),
                headlines: None,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl HeadlineSource for CannedSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn try_fetch(&self, _fetcher: &dyn DocumentFetcher) -> Result<Vec<Headline>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.headlines
                .clone()
                .ok_or_else(|| SourceError::Status { status: 503, url: format!("https://{}.test", self.name) })
        }
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_surviving_source() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = NewsAggregator::new(
            vec![
                CannedSource::failing("a", &calls),
                CannedSource::failing("b", &calls),
                CannedSource::ok("c", 5, &calls),
                CannedSource::failing("d", &calls),
            ],
            Arc::new(NullFetcher),
        );

        let headlines = aggregator.fetch_all().await.unwrap();
        assert_eq!(headlines.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_all_sources_failing_is_no_headlines() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = NewsAggregator::new(
            vec![
                CannedSource::failing("a", &calls),
                CannedSource::ok("b", 0, &calls),
                CannedSource::failing("c", &calls),
            ],
            Arc::new(NullFetcher),
        );

        let result = aggregator.fetch_all().await;
        assert_eq!(result, Err(NewsError::NoHeadlinesAvailable));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_concatenates_in_declaration_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let aggregator = NewsAggregator::new(
            vec![CannedSource::ok("first", 2, &calls), CannedSource::ok("second", 1, &calls)],
            Arc::new(NullFetcher),
        );

        let titles: Vec<String> = aggregator
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.title)
            .collect();
        assert_eq!(titles, vec!["first story 0", "first story 1", "second story 0"]);
        assert_eq!(aggregator.source_names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_real_adapters_over_dead_transport() {
        let aggregator = NewsAggregator::new(default_sources(), Arc::new(NullFetcher));
        assert_eq!(aggregator.fetch_all().await, Err(NewsError::NoHeadlinesAvailable));
    }
}
