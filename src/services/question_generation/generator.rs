use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::dedup::QuestionSetDeduplicator;
use super::parser::parse_question_lines;
use super::profile::ContentTypeProfile;
use crate::config::{GenerationConfig, LlmConfig};
use crate::models::GenerationContext;
use crate::services::llm::{BatchedCompletionClient, ChatMessage, LLMError, SamplingParams, TokenUsage};
use crate::utils::{normalize_text, unique_ordered_by};

/// Knobs of the per-generation batch loop
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub model: String,
    pub sampling: SamplingParams,
    pub batch_size: u32,
    pub throttle: Duration,
    /// Recent questions quoted in the prompt as "do not repeat"
    pub prompt_context: usize,
}

impl GeneratorSettings {
    pub fn from_config(llm: &LlmConfig, generation: &GenerationConfig) -> Self {
        Self {
            model: llm.question_model.clone(),
            sampling: SamplingParams {
                temperature: llm.question_temperature,
                max_tokens: llm.question_max_tokens,
            },
            batch_size: generation.batch_size,
            throttle: Duration::from_millis(generation.throttle_ms),
            prompt_context: generation.prompt_context,
        }
    }
}

/// Questions produced for one vehicle generation
#[derive(Debug, Clone, Default)]
pub struct GeneratedQuestions {
    pub questions: Vec<String>,
    pub usage: TokenUsage,
    pub upstream_calls: u32,
}

/// Split `requested` into upstream calls of at most `batch_size` questions.
///
/// `batch_sizes(250, 100) == [100, 100, 50]`
pub fn batch_sizes(requested: u32, batch_size: u32) -> Vec<u32> {
    let batch_size = batch_size.max(1);
    let batches = requested.div_ceil(batch_size);
    (0..batches)
        .map(|i| if i == batches - 1 { requested - i * batch_size } else { batch_size })
        .collect()
}

pub struct QuestionGenerator {
    client: Arc<BatchedCompletionClient>,
    settings: GeneratorSettings,
}

impl QuestionGenerator {
    pub fn new(client: Arc<BatchedCompletionClient>, settings: GeneratorSettings) -> Self {
        Self { client, settings }
    }

    /// Generate up to `requested` questions for `vehicle`.
    ///
    /// Every returned question has been registered in `dedup` and collided with
    /// nothing that was there before. Under-production is not an error; a batch
    /// without usable lines is skipped. An upstream failure that survives the
    /// retry policy aborts the generation.
    pub async fn generate(
        &self,
        vehicle: &GenerationContext,
        requested: u32,
        profile: &ContentTypeProfile,
        dedup: &mut QuestionSetDeduplicator,
        cancel: &CancellationToken,
    ) -> Result<GeneratedQuestions, LLMError> {
        let plan = batch_sizes(requested, self.settings.batch_size);
        let target = requested as usize;
        let mut result = GeneratedQuestions::default();

        tracing::info!(
            "Generating {} {} questions for {} ({} batches)",
            requested,
            profile.content_type.as_str(),
            vehicle.generation_id,
            plan.len()
        );

        for (index, &batch_count) in plan.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(LLMError::Cancelled);
            }
            if result.questions.len() >= target {
                break;
            }
            if index > 0 && !self.settings.throttle.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(LLMError::Cancelled),
                    _ = tokio::time::sleep(self.settings.throttle) => {},
                }
            }

            let prompt = profile.question_prompt(
                vehicle,
                batch_count,
                &dedup.recent(self.settings.prompt_context),
            );
            let messages =
                vec![ChatMessage::system(profile.question_system_prompt()), ChatMessage::user(prompt)];

            let completion = self
                .client
                .complete(&self.settings.model, messages, &self.settings.sampling, cancel)
                .await
                .inspect_err(|e| {
                    tracing::error!(
                        "Batch {}/{} for {} failed: {}",
                        index + 1,
                        plan.len(),
                        vehicle.generation_id,
                        e
                    )
                })?;
            result.upstream_calls += 1;
            result.usage += completion.usage;

            let candidates = parse_question_lines(&completion.text);
            let parsed = candidates.len();
            let mut accepted = 0usize;
            for candidate in candidates {
                if result.questions.len() >= target {
                    break;
                }
                if dedup.add(&candidate) {
                    result.questions.push(candidate);
                    accepted += 1;
                }
            }

            if parsed == 0 {
                tracing::warn!(
                    "Batch {}/{} for {} returned no usable lines",
                    index + 1,
                    plan.len(),
                    vehicle.generation_id
                );
            }
            tracing::debug!(
                "Batch {}/{} for {}: requested={}, parsed={}, accepted={}, duplicates={}, tokens={}/{}",
                index + 1,
                plan.len(),
                vehicle.generation_id,
                batch_count,
                parsed,
                accepted,
                parsed - accepted,
                completion.usage.input_tokens,
                completion.usage.output_tokens
            );
        }

        result.questions = unique_ordered_by(result.questions, |q| normalize_text(q));
        result.questions.truncate(target);

        tracing::info!(
            "Generated {}/{} questions for {} in {} calls",
            result.questions.len(),
            requested,
            vehicle.generation_id,
            result.upstream_calls
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_sizes() {
        assert_eq!(batch_sizes(250, 100), vec![100, 100, 50]);
        assert_eq!(batch_sizes(100, 100), vec![100]);
        assert_eq!(batch_sizes(5, 100), vec![5]);
        assert_eq!(batch_sizes(201, 100), vec![100, 100, 1]);
        assert!(batch_sizes(0, 100).is_empty());
    }

    #[test]
    fn test_batch_sizes_sum_to_requested() {
        for requested in [1, 99, 100, 101, 999, 50_000] {
            let plan = batch_sizes(requested, 100);
            assert_eq!(plan.iter().sum::<u32>(), requested);
            assert!(plan.iter().all(|&n| n > 0 && n <= 100));
        }
    }
}
