use async_trait::async_trait;
use news_core::Headline;
use scraper::{ElementRef, Html, Selector};

use crate::{DocumentFetcher, HeadlineSource, SourceError};

/// Where to find headlines inside a page.
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// Selector for the repeating item container
    pub item: String,
    /// Sub-selector for the title text; `None` reads the item itself
    pub title: Option<String>,
    /// Sub-selector for the link element; `None` reads the item itself
    pub link: Option<String>,
    pub link_attr: String,
}

impl ExtractionRules {
    /// Rules for pages where every item is itself an anchor.
    pub fn anchors(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            title: None,
            link: None,
            link_attr: "href".to_string(),
        }
    }

    pub fn nested(item: impl Into<String>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            title: Some(title.into()),
            link: Some(link.into()),
            link_attr: "href".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// Prefix for relative links
    pub base_url: String,
    pub rules: ExtractionRules,
}

/// Markup scraper driven by CSS selectors.
pub struct ScrapeSource {
    config: SourceConfig,
}

impl ScrapeSource {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Pull headlines out of an already-fetched document.
    pub fn extract(&self, body: &str) -> Result<Vec<Headline>, SourceError> {
        let rules = &self.config.rules;
        let item_selector = parse_selector(&rules.item)?;
        let title_selector = rules.title.as_deref().map(parse_selector).transpose()?;
        let link_selector = rules.link.as_deref().map(parse_selector).transpose()?;

        let document = Html::parse_document(body);
        let mut headlines = Vec::new();

        for item in document.select(&item_selector) {
            let title = first_match(item, title_selector.as_ref())
                .map(element_text)
                .unwrap_or_default();
            let link = first_match(item, link_selector.as_ref())
                .and_then(|el| el.value().attr(&rules.link_attr))
                .map(str::trim)
                .unwrap_or_default();

            if title.is_empty() || link.is_empty() {
                continue;
            }

            headlines.push(Headline::new(title, resolve_link(&self.config.base_url, link)));
        }

        Ok(headlines)
    }
}

#[async_trait]
impl HeadlineSource for ScrapeSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn try_fetch(&self, fetcher: &dyn DocumentFetcher) -> Result<Vec<Headline>, SourceError> {
        let body = fetcher.fetch(&self.config.url).await?;
        self.extract(&body)
    }
}

/// Make a scraped link absolute.
///
/// `http...` links pass through, `/path` is appended to `base`.
pub fn resolve_link(base: &str, link: &str) -> String {
    let base = base.trim_end_matches('/');
    if link.starts_with("http") {
        link.to_string()
    } else if let Some(rest) = link.strip_prefix("//") {
        format!("https://{rest}")
    } else if link.starts_with('/') {
        format!("{base}{link}")
    } else {
        format!("{base}/{link}")
    }
}

fn parse_selector(selector: &str) -> Result<Selector, SourceError> {
    Selector::parse(selector).map_err(|e| SourceError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn first_match<'a>(item: ElementRef<'a>, selector: Option<&Selector>) -> Option<ElementRef<'a>> {
    match selector {
        Some(selector) => item.select(selector).next(),
        None => Some(item),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
