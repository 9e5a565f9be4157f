use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NewsError {
    /// Every source failed or returned nothing.
    #[error("No headlines fetched from any source.")]
    NoHeadlinesAvailable,

    #[error("Invalid ticker: {0:?}")]
    InvalidTicker(String),
}
