pub mod error;
pub mod openai;
pub mod prompt;
pub mod remote;

pub use error::{LlmError, LlmResult};
pub use openai::OpenAiClient;
pub use remote::RemoteAnalysisClient;

use async_trait::async_trait;
use std::time::Duration;

/// Something that turns a (headline, ticker) pair into free-text analysis.
///
/// The text is expected to follow the four-section layout of
/// [`prompt::analysis_prompt`] but nothing guarantees it.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, headline: &str, ticker: &str) -> LlmResult<String>;

    fn backend_name(&self) -> &'static str;
}

/// Configuration for the chat-completions backend
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.4,
            timeout: Duration::from_secs(30),
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty()),
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: defaults.temperature,
            timeout: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}
