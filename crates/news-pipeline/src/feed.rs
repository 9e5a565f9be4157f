use news_core::{AnnotationState, SentimentLabel, SentimentReport, TaggedHeadline};
use serde::Serialize;

/// Snapshot of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub portfolio: Vec<String>,
    pub headlines: Vec<FeedEntry>,
}

/// A tagged headline together with where its annotation stands.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    #[serde(flatten)]
    pub tagged: TaggedHeadline,
    pub status: &'static str,
    pub report: Option<SentimentReport>,
    /// Present once the annotation is terminal
    pub label: Option<SentimentLabel>,
}

impl FeedEntry {
    pub fn new(tagged: TaggedHeadline, state: &AnnotationState) -> Self {
        let report = state.report().cloned();
        Self {
            tagged,
            status: state.name(),
            label: report.as_ref().map(SentimentReport::label),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use news_core::Headline;
    use serde_json::json;

    fn tagged() -> TaggedHeadline {
        TaggedHeadline {
            headline: Headline::new("PNB posts record profit", "https://news.test/pnb"),
            matched_stocks: vec!["PNB".to_string()],
        }
    }

    #[test]
    fn test_pending_entry_has_no_report() {
        let value = serde_json::to_value(FeedEntry::new(tagged(), &AnnotationState::Pending)).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "PNB posts record profit",
                "link": "https://news.test/pnb",
                "matched_stocks": ["PNB"],
                "status": "pending",
                "report": null,
                "label": null,
            })
        );
    }

    #[test]
    fn test_fallback_entry_is_neutral() {
        let state = AnnotationState::Fallback(SentimentReport::fallback());
        let entry = FeedEntry::new(tagged(), &state);
        assert_eq!(entry.status, "fallback");
        assert_eq!(entry.label, Some(SentimentLabel::Neutral));
        assert_eq!(entry.report, Some(SentimentReport::fallback()));
    }
}
