//! Keyword matching of headlines against a portfolio.

mod synonyms;

pub use synonyms::TickerSynonymMap;

use news_core::{Headline, Portfolio, TaggedHeadline};

/// Portfolio tickers mentioned by `headline`, in portfolio order.
///
/// A ticker matches when any of its keywords is a case-insensitive substring
/// of the title.
pub fn match_tickers(headline: &Headline, portfolio: &Portfolio, synonyms: &TickerSynonymMap) -> Vec<String> {
    let title = headline.title.to_lowercase();

    portfolio
        .iter()
        .filter(|ticker| {
            synonyms
                .keywords_for(ticker)
                .iter()
                .any(|keyword| title.contains(&keyword.to_lowercase()))
        })
        .map(str::to_string)
        .collect()
}

/// Tag every headline; headlines matching nothing are dropped.
pub fn tag_headlines(
    news: &[Headline],
    portfolio: &Portfolio,
    synonyms: &TickerSynonymMap,
) -> Vec<TaggedHeadline> {
    if portfolio.is_empty() {
        return Vec::new();
    }

    news.iter()
        .filter_map(|headline| {
            let matched_stocks = match_tickers(headline, portfolio, synonyms);
            if matched_stocks.is_empty() {
                None
            } else {
                Some(TaggedHeadline {
                    headline: headline.clone(),
                    matched_stocks,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pnb_map() -> TickerSynonymMap {
        let mut map = TickerSynonymMap::new();
        map.insert("PNB", ["PNB", "Punjab National Bank"]);
        map
    }

    #[test]
    fn test_pnb_end_to_end() {
        let portfolio: Portfolio = ["PNB"].into_iter().collect();
        let news = vec![
            Headline::new("Punjab National Bank reports profit", "x"),
            Headline::new("Unrelated story", "y"),
        ];

        let tagged = tag_headlines(&news, &portfolio, &pnb_map());
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].headline.link, "x");
        assert_eq!(tagged[0].matched_stocks, vec!["PNB"]);
    }

    #[test]
    fn test_unmapped_ticker_matches_its_own_symbol() {
        let map = TickerSynonymMap::new();
        let portfolio: Portfolio = ["INFY"].into_iter().collect();

        let hit = Headline::new("Infy shares slide after guidance cut", "a");
        let miss = Headline::new("Infosys shares slide", "b");
        assert_eq!(match_tickers(&hit, &portfolio, &map), vec!["INFY"]);
        assert!(match_tickers(&miss, &portfolio, &map).is_empty());
    }

    #[test]
    fn test_match_is_ordered_subset_of_portfolio() {
        let mut map = pnb_map();
        map.insert("SBIN", ["State Bank of India", "SBI"]);
        let portfolio: Portfolio = ["TCS", "SBIN", "NIFTY", "PNB"].into_iter().collect();
        let headline = Headline::new("PNB, SBI lead PSU bank rally as nifty hits high", "z");

        let first = match_tickers(&headline, &portfolio, &map);
        assert_eq!(first, vec!["SBIN", "NIFTY", "PNB"]);
        assert!(first.iter().all(|t| portfolio.contains(t)));
        assert_eq!(match_tickers(&headline, &portfolio, &map), first);
    }

    #[test]
    fn test_tagged_entries_are_never_empty() {
        let portfolio: Portfolio = ["TCS", "WIPRO"].into_iter().collect();
        let news = vec![
            Headline::new("TCS bags large deal", "1"),
            Headline::new("Monsoon update", "2"),
            Headline::new("Wipro and TCS slip", "3"),
        ];

        let tagged = tag_headlines(&news, &portfolio, &TickerSynonymMap::new());
        assert!(tagged.len() <= news.len());
        assert!(tagged.iter().all(|t| !t.matched_stocks.is_empty()));
        assert_eq!(tagged.len(), 2);
        assert_eq!(tagged[1].matched_stocks, vec!["TCS", "WIPRO"]);
    }

    #[test]
    fn test_empty_portfolio_tags_nothing() {
        let news = vec![Headline::new("Sensex jumps", "1")];
        assert!(tag_headlines(&news, &Portfolio::new(), &TickerSynonymMap::builtin()).is_empty());
    }
}
