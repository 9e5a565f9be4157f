use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{LlmError, LlmResult};
use crate::AnalysisBackend;

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    headline: &'a str,
    ticker: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    analysis: Option<String>,
}

/// Client for a remote sentiment endpoint speaking
/// `POST {headline, ticker} -> {analysis}`.
#[derive(Clone)]
pub struct RemoteAnalysisClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteAnalysisClient {
    pub fn new(endpoint: String, timeout: Duration) -> LlmResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisBackend for RemoteAnalysisClient {
    async fn analyze(&self, headline: &str, ticker: &str) -> LlmResult<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { headline, ticker })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::ServiceUnavailable(format!(
                "Status: {}",
                response.status()
            )));
        }

        response
            .json::<AnalyzeResponse>()
            .await?
            .analysis
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("response has no analysis".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(AnalyzeRequest { headline: "Nifty slips", ticker: "NIFTY" }).unwrap();
        assert_eq!(body, serde_json::json!({ "headline": "Nifty slips", "ticker": "NIFTY" }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_an_error() {
        let client = RemoteAnalysisClient::new(
            "http://127.0.0.1:9/api/sentiment/analyze".to_string(),
            Duration::from_millis(500),
        )
        .unwrap();
        assert!(client.analyze("Nifty slips", "NIFTY").await.is_err());
    }
}
