use async_trait::async_trait;
use news_core::Headline;
use rss::Channel;

use crate::{DocumentFetcher, HeadlineSource, SourceError};

/// RSS reader mapping feed items straight to headlines.
pub struct FeedSource {
    name: String,
    url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn parse(&self, body: &str) -> Result<Vec<Headline>, SourceError> {
        let channel =
            Channel::read_from(body.as_bytes()).map_err(|e| SourceError::Feed(e.to_string()))?;

        let headlines = channel
            .items()
            .iter()
            .filter_map(|item| {
                let title = item.title()?.trim();
                let link = item.link()?.trim();
                if title.is_empty() || link.is_empty() {
                    return None;
                }
                Some(Headline::new(title, link))
            })
            .collect();

        Ok(headlines)
    }
}

#[async_trait]
impl HeadlineSource for FeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn try_fetch(&self, fetcher: &dyn DocumentFetcher) -> Result<Vec<Headline>, SourceError> {
        let body = fetcher.fetch(&self.url).await?;
        self.parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>indian stock market - Google News</title>
    <link>https://news.google.com</link>
    <description>Google News</description>
    <item>
      <title>HDFC Bank shares hit record high</title>
      <link>https://news.google.com/articles/1</link>
    </item>
    <item>
      <title>Story without a link</title>
    </item>
    <item>
      <title>   </title>
      <link>https://news.google.com/articles/3</link>
    </item>
    <item>
      <title>Sensex, Nifty close lower</title>
      <link>https://news.google.com/articles/4</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_items() {
        let source = FeedSource::new("Google News RSS", "https://news.google.com/rss");
        let headlines = source.parse(FEED).unwrap();

        assert_eq!(
            headlines,
            vec![
                Headline::new("HDFC Bank shares hit record high", "https://news.google.com/articles/1"),
                Headline::new("Sensex, Nifty close lower", "https://news.google.com/articles/4"),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_non_feed() {
        let source = FeedSource::new("Google News RSS", "https://news.google.com/rss");
        assert!(matches!(source.parse("<html><body>captcha</body></html>"), Err(SourceError::Feed(_))));
    }
}
