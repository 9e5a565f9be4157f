use serde::{Deserialize, Serialize};

/// A single news item as extracted from a source.
///
/// Two sources carrying the same story produce two distinct headlines;
/// nothing downstream deduplicates them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Headline {
    pub title: String,
    pub link: String,
}

impl Headline {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}

/// A headline plus the portfolio tickers whose keywords it mentions.
///
/// `matched_stocks` is never empty and keeps portfolio order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TaggedHeadline {
    #[serde(flatten)]
    pub headline: Headline,
    pub matched_stocks: Vec<String>,
}

impl TaggedHeadline {
    pub fn key(&self) -> AnnotationKey {
        AnnotationKey {
            link: self.headline.link.clone(),
            matched_stocks: self.matched_stocks.clone(),
        }
    }
}

/// Identity of one annotation: the headline link and the candidate tickers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationKey {
    pub link: String,
    pub matched_stocks: Vec<String>,
}

/// Four-section model report. Any section may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SentimentReport {
    pub summary: Option<String>,
    pub advice: Option<String>,
    pub outlook: Option<String>,
    pub sentiment: Option<String>,
}

impl SentimentReport {
    /// The neutral report substituted when no analysis could be obtained.
    pub fn fallback() -> Self {
        Self {
            summary: Some("No significant information found.".to_string()),
            advice: Some("Hold".to_string()),
            outlook: Some("Stable".to_string()),
            sentiment: Some("Neutral".to_string()),
        }
    }

    pub fn has_any_section(&self) -> bool {
        self.summary.is_some()
            || self.advice.is_some()
            || self.outlook.is_some()
            || self.sentiment.is_some()
    }

    pub fn label(&self) -> SentimentLabel {
        self.sentiment
            .as_deref()
            .map(SentimentLabel::classify)
            .unwrap_or(SentimentLabel::Neutral)
    }
}

/// Lifecycle of the annotation attached to one tagged headline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "report", rename_all = "lowercase")]
pub enum AnnotationState {
    #[default]
    Idle,
    Pending,
    Resolved(SentimentReport),
    Fallback(SentimentReport),
}

impl AnnotationState {
    /// Resolved and Fallback never change again within a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnnotationState::Resolved(_) | AnnotationState::Fallback(_))
    }

    pub fn report(&self) -> Option<&SentimentReport> {
        match self {
            AnnotationState::Resolved(report) | AnnotationState::Fallback(report) => Some(report),
            AnnotationState::Idle | AnnotationState::Pending => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnnotationState::Idle => "idle",
            AnnotationState::Pending => "pending",
            AnnotationState::Resolved(_) => "resolved",
            AnnotationState::Fallback(_) => "fallback",
        }
    }
}

/// Display classification of a sentiment section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Literal, case-sensitive test: "Positive" wins over "Negative".
    pub fn classify(text: &str) -> Self {
        if text.contains("Positive") {
            SentimentLabel::Positive
        } else if text.contains("Negative") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        }
    }
}
