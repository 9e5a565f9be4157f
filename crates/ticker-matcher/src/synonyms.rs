use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Ticker → keywords that signal a headline is about it.
///
/// Keys are stored upper-cased, so lookups are case-insensitive. A ticker
/// without an entry is matched on its own symbol.
#[derive(Debug, Clone, Default)]
pub struct TickerSynonymMap {
    entries: HashMap<String, Vec<String>>,
}

const BUILTIN: &[(&str, &[&str])] = &[
    ("PNB", &["PNB", "Punjab National Bank"]),
    ("SBIN", &["SBI", "State Bank of India"]),
    ("RELIANCE", &["Reliance Industries", "Reliance"]),
    ("TCS", &["TCS", "Tata Consultancy"]),
    ("INFY", &["Infosys", "INFY"]),
    ("HDFCBANK", &["HDFC Bank"]),
    ("ICICIBANK", &["ICICI Bank"]),
    ("AXISBANK", &["Axis Bank"]),
    ("KOTAKBANK", &["Kotak Mahindra Bank", "Kotak Bank"]),
    ("BAJFINANCE", &["Bajaj Finance"]),
    ("TATAMOTORS", &["Tata Motors"]),
    ("TATASTEEL", &["Tata Steel"]),
    ("MARUTI", &["Maruti Suzuki", "Maruti"]),
    ("BHARTIARTL", &["Bharti Airtel", "Airtel"]),
    ("HINDUNILVR", &["Hindustan Unilever", "HUL"]),
    ("ADANIENT", &["Adani Enterprises", "Adani"]),
    ("LT", &["Larsen & Toubro", "L&T"]),
    ("WIPRO", &["Wipro"]),
    ("ITC", &["ITC Ltd", "ITC shares"]),
    ("NIFTY", &["Nifty"]),
    ("SENSEX", &["Sensex"]),
];

impl TickerSynonymMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in map of common NSE/BSE names.
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for (ticker, keywords) in BUILTIN {
            map.insert(ticker, keywords.iter().copied());
        }
        map
    }

    /// Load from `TICKER_SYNONYMS_PATH` if set, otherwise the built-in map.
    ///
    /// A missing or unreadable file is logged and the built-in map is used.
    pub fn from_env() -> Self {
        match std::env::var("TICKER_SYNONYMS_PATH") {
            Ok(path) if !path.trim().is_empty() => match Self::from_file(Path::new(path.trim())) {
                Ok(map) => {
                    tracing::info!("Loaded {} ticker synonym entries from {}", map.len(), path);
                    map
                }
                Err(e) => {
                    tracing::warn!("Failed to load ticker synonyms from {}: {}. Using built-in map.", path, e);
                    Self::builtin()
                }
            },
            _ => Self::builtin(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Parse a JSON object of `ticker -> [keyword, ...]`.
    ///
    /// Only a non-object document is an error. Malformed entries are skipped
    /// with a warning, which leaves that ticker matching on its symbol alone.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        let document: Value = serde_json::from_str(raw)?;
        let mut map = Self::new();

        let Value::Object(entries) = document else {
            return Err(serde::de::Error::custom("ticker synonyms must be a JSON object"));
        };

        for (ticker, value) in entries {
            let Value::Array(items) = value else {
                tracing::warn!("Ignoring synonyms for {}: expected an array of strings", ticker);
                continue;
            };

            let keywords: Vec<&str> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .collect();

            if keywords.len() != items.len() {
                tracing::warn!("Dropped {} malformed synonym(s) for {}", items.len() - keywords.len(), ticker);
            }

            map.insert(&ticker, keywords);
        }

        Ok(map)
    }

    /// Set the keywords for `ticker`. An empty list removes the entry.
    pub fn insert<I, S>(&mut self, ticker: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = ticker.trim().to_uppercase();
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        if key.is_empty() || keywords.is_empty() {
            self.entries.remove(&key);
            return;
        }
        self.entries.insert(key, keywords);
    }

    /// Keywords for `ticker`, falling back to the symbol itself.
    pub fn keywords_for<'a>(&'a self, ticker: &'a str) -> Vec<&'a str> {
        match self.entries.get(&ticker.to_uppercase()) {
            Some(keywords) => keywords.iter().map(String::as_str).collect(),
            None => vec![ticker],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
