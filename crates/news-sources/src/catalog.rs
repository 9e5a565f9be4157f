use crate::{ExtractionRules, FeedSource, HeadlineSource, ScrapeSource, SourceConfig};

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search?q=indian+stock+market";

/// The Indian market sources, in declaration order.
pub fn default_sources() -> Vec<Box<dyn HeadlineSource>> {
    vec![
        Box::new(ScrapeSource::new(SourceConfig {
            name: "Moneycontrol".to_string(),
            url: "https://www.moneycontrol.com/news/business/markets/".to_string(),
            base_url: "https://www.moneycontrol.com".to_string(),
            rules: ExtractionRules::nested("li.clearfix", "h2", "a"),
        })),
        Box::new(ScrapeSource::new(SourceConfig {
            name: "Economic Times".to_string(),
            url: "https://economictimes.indiatimes.com/markets".to_string(),
            base_url: "https://economictimes.indiatimes.com".to_string(),
            rules: ExtractionRules::anchors("ul.data-list li a"),
        })),
        Box::new(ScrapeSource::new(SourceConfig {
            name: "LiveMint".to_string(),
            url: "https://www.livemint.com/market".to_string(),
            base_url: "https://www.livemint.com".to_string(),
            rules: ExtractionRules::anchors("div.listingNews a"),
        })),
        Box::new(ScrapeSource::new(SourceConfig {
            name: "Business Standard".to_string(),
            url: "https://www.business-standard.com/category/markets/news".to_string(),
            base_url: "https://www.business-standard.com".to_string(),
            rules: ExtractionRules::anchors("div.listing-txt a"),
        })),
        Box::new(FeedSource::new("Google News RSS", GOOGLE_NEWS_RSS)),
    ]
}
