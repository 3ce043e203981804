//! LLM Data Models
//!
//! Wire-level chat-completion types and the error taxonomy shared by the
//! transport, the retry policy and the batched client.

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use std::time::Duration;

// ============================================================================
// Chat messages and sampling
// ============================================================================

/// One chat turn in OpenAI format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Sampling parameters attached to a completion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Request body for `POST {api_base}/chat/completions`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, sampling: &SamplingParams) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        }
    }
}

/// Token accounting reported by the upstream API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: i64,
    pub output_tokens: i64,
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens += rhs.input_tokens;
        self.output_tokens += rhs.output_tokens;
    }
}

/// Free text returned by one successful completion call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatCompletion {
    pub text: String,
    pub usage: TokenUsage,
}

// ============================================================================
// LLM Error Types
// ============================================================================

/// Errors raised while talking to the chat-completion API
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("LLM API key not configured")]
    NotConfigured,

    #[error("LLM API error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("LLM network error: {0}")]
    Network(String),

    #[error("LLM timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid LLM request: {0}")]
    InvalidRequest(String),

    #[error("LLM response parsing error: {0}")]
    ParseError(String),

    #[error("LLM request cancelled")]
    Cancelled,
}

impl LLMError {
    /// Rate limits, server errors, timeouts and transport failures are worth
    /// another attempt. Every other failure is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Network(_) | Self::Timeout(_) => true,
            Self::NotConfigured | Self::InvalidRequest(_) | Self::ParseError(_) | Self::Cancelled => {
                false
            },
        }
    }
}

/// Marker produced by the retry policy when its cancellation token fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl From<Cancelled> for LLMError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}
