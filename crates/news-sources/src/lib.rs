//! Headline sources and the aggregator that fans out over them.
//!
//! Each source owns its own failure: a broken page, a changed layout or a
//! timeout is logged and turns into "no headlines from this source". Only the
//! aggregator decides whether the combined result is usable.

mod aggregator;
mod catalog;
mod error;
mod feed;
mod fetcher;
mod scrape;

pub use aggregator::NewsAggregator;
pub use catalog::default_sources;
pub use error::SourceError;
pub use feed::FeedSource;
pub use fetcher::{DocumentFetcher, HttpFetcher, BROWSER_USER_AGENT};
pub use scrape::{resolve_link, ExtractionRules, ScrapeSource, SourceConfig};

use async_trait::async_trait;
use news_core::Headline;

/// One news provider.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch and extract, surfacing every failure.
    async fn try_fetch(&self, fetcher: &dyn DocumentFetcher) -> Result<Vec<Headline>, SourceError>;

    /// Fetch and extract, absorbing failures into an empty result.
    async fn fetch(&self, fetcher: &dyn DocumentFetcher) -> Vec<Headline> {
        match self.try_fetch(fetcher).await {
            Ok(headlines) => {
                tracing::debug!("{}: {} headlines", self.name(), headlines.len());
                headlines
            }
            Err(e) => {
                tracing::warn!("{} scraping failed: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}
