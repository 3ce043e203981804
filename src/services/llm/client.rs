//! LLM Client - HTTP transport for OpenAI-compatible APIs
//!
//! Uses reqwest to call the chat completion endpoint. Compatible with:
//! - OpenAI
//! - Azure OpenAI
//! - DeepSeek
//! - Other OpenAI-compatible APIs
//!
//! One `send` is exactly one HTTP attempt; retries live in [`super::RetryPolicy`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::models::*;
use crate::config::LlmConfig;

/// A single chat-completion attempt against some upstream
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LLMError>;
}

/// reqwest-backed transport for `POST {api_base}/chat/completions`
pub struct OpenAITransport {
    http_client: Client,
    api_base: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl OpenAITransport {
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LLMError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client, api_base: api_base.into(), api_key, timeout })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LLMError> {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LLMError {
        if e.is_timeout() {
            LLMError::Timeout(self.timeout)
        } else if e.is_builder() {
            LLMError::InvalidRequest(e.to_string())
        } else if e.is_connect() {
            LLMError::Network(format!("Connection failed: {}", e))
        } else {
            LLMError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl CompletionTransport for OpenAITransport {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LLMError> {
        let api_key = self.api_key.as_deref().ok_or(LLMError::NotConfigured)?;

        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));

        tracing::debug!("Calling LLM API: {} with model {}", url, request.model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LLMError::Http {
                status: status.as_u16(),
                message: extract_error_message(&error_text),
            });
        }

        // Body read failures are transport failures, decode failures are not.
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;
        let chat_response: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| LLMError::ParseError(format!("Invalid completion body: {}", e)))?;

        let text = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let usage = chat_response
            .usage
            .map(|u| TokenUsage { input_tokens: u.prompt_tokens, output_tokens: u.completion_tokens })
            .unwrap_or_default();

        Ok(ChatCompletion { text, usage })
    }
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw text
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_string())
}

// ============================================================================
// OpenAI API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: i64,
    completion_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
