//! Anthropic Messages API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{CompletionClient, LlmError, MessagesRequest, MessagesResponse};

/// Hosted Messages API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// reqwest-backed client with an explicit per-call timeout.
pub struct AnthropicClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn create_message(&self, request: MessagesRequest) -> Result<MessagesResponse, LlmError> {
        tracing::debug!(model = %request.model, messages = request.messages.len(), "calling completion API");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
