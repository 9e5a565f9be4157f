//! Model-backed sentiment reports for tagged headlines.
//!
//! [`parse_report`] turns the model's numbered free text into a
//! [`SentimentReport`](news_core::SentimentReport); [`SentimentAnnotator`]
//! drives the per-headline retry and fallback policy over an
//! [`AnalysisBackend`](llm_client::AnalysisBackend).

mod annotator;
mod parser;

pub use annotator::{AnnotationError, AnnotationOutcome, AnnotatorConfig, SentimentAnnotator};
pub use parser::parse_report;
