use serde::{Deserialize, Serialize};

use crate::NewsError;

/// Ordered, deduplicated set of upper-cased ticker symbols.
///
/// Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    tickers: Vec<String>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise user input into a ticker symbol.
    pub fn normalize(raw: &str) -> Result<String, NewsError> {
        let ticker = raw.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(NewsError::InvalidTicker(raw.to_string()));
        }
        Ok(ticker)
    }

    /// Add a ticker. Returns `Ok(false)` when it was already present.
    pub fn insert(&mut self, raw: &str) -> Result<bool, NewsError> {
        let ticker = Self::normalize(raw)?;
        if self.tickers.contains(&ticker) {
            return Ok(false);
        }
        self.tickers.push(ticker);
        Ok(true)
    }

    /// Remove a ticker, keeping the order of the rest.
    pub fn remove(&mut self, raw: &str) -> bool {
        let Ok(ticker) = Self::normalize(raw) else {
            return false;
        };
        let before = self.tickers.len();
        self.tickers.retain(|t| *t != ticker);
        self.tickers.len() != before
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.iter().any(|t| t.eq_ignore_ascii_case(ticker))
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tickers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Portfolio {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut portfolio = Portfolio::new();
        for raw in iter {
            // Blank entries are skipped
            let _ = portfolio.insert(raw.as_ref());
        }
        portfolio
    }
}
