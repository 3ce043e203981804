//! Batched completion client
//!
//! One logical completion = retry policy + per-attempt timeout + cancellation
//! around a [`CompletionTransport`].

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::client::CompletionTransport;
use super::models::*;
use super::retry::RetryPolicy;

pub struct BatchedCompletionClient {
    transport: Arc<dyn CompletionTransport>,
    policy: RetryPolicy,
    attempt_timeout: Duration,
}

impl BatchedCompletionClient {
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        policy: RetryPolicy,
        attempt_timeout: Duration,
    ) -> Self {
        Self { transport, policy, attempt_timeout }
    }

    /// Send one chat completion, retrying transient failures.
    ///
    /// A hung attempt is cut off after `attempt_timeout` and counts as a
    /// retryable failure. Cancellation drops the in-flight request.
    pub async fn complete(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        sampling: &SamplingParams,
        cancel: &CancellationToken,
    ) -> Result<ChatCompletion, LLMError> {
        let request = &ChatCompletionRequest::new(model, messages, sampling);
        let transport = &self.transport;
        let attempt_timeout = self.attempt_timeout;

        self.policy
            .run(cancel, LLMError::is_retryable, move |attempt| async move {
                tracing::debug!("Chat completion attempt {} (model {})", attempt, request.model);

                tokio::select! {
                    _ = cancel.cancelled() => Err(LLMError::Cancelled),
                    result = tokio::time::timeout(attempt_timeout, transport.send(request)) => {
                        result.unwrap_or(Err(LLMError::Timeout(attempt_timeout)))
                    },
                }
            })
            .await
    }
}
