use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::dedup::QuestionSetDeduplicator;
use super::generator::QuestionGenerator;
use super::profile::ContentTypeProfile;
use crate::config::{GenerationConfig, LlmConfig};
use crate::models::GenerationContext;
use crate::services::llm::{ChatMessage, LLMError, SamplingParams, TokenUsage};

pub const ANSWER_REQUEST_METHOD: &str = "POST";
pub const ANSWER_REQUEST_URL: &str = "/v1/chat/completions";

/// One line of the batch file: a chat-completion request for a single answer.
///
/// `custom_id` is `answer-{generationId}-{sequence}`; downstream reassembly
/// parses it, so the shape is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequestRecord {
    pub custom_id: String,
    pub method: String,
    pub url: String,
    pub body: AnswerRequestBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRequestBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl AnswerRequestRecord {
    pub fn correlation_key(generation_id: &str, sequence: u64) -> String {
        format!("answer-{}-{}", generation_id, sequence)
    }
}

/// Model and sampling written into every answer request
#[derive(Debug, Clone)]
pub struct AnswerSettings {
    pub model: String,
    pub sampling: SamplingParams,
}

impl AnswerSettings {
    pub fn from_config(llm: &LlmConfig, generation: &GenerationConfig) -> Self {
        Self {
            model: llm.answer_model.clone(),
            sampling: SamplingParams {
                temperature: generation.answer_temperature,
                max_tokens: generation.answer_max_tokens,
            },
        }
    }
}

/// Records of a finished run plus accounting
#[derive(Debug, Clone, Default)]
pub struct AssembledJob {
    pub records: Vec<AnswerRequestRecord>,
    pub generations_processed: usize,
    pub usage: TokenUsage,
}

/// Runs the generator over every vehicle generation of one job.
///
/// Holds the job's dedup set and sequence counter; a fresh assembler is built
/// per job and consumed by [`BatchJobAssembler::assemble`].
pub struct BatchJobAssembler<'a> {
    generator: &'a QuestionGenerator,
    answer: &'a AnswerSettings,
    dedup: QuestionSetDeduplicator,
    next_sequence: u64,
}

impl<'a> BatchJobAssembler<'a> {
    pub fn new(generator: &'a QuestionGenerator, answer: &'a AnswerSettings, recent_window: usize) -> Self {
        Self { generator, answer, dedup: QuestionSetDeduplicator::new(recent_window), next_sequence: 1 }
    }

    /// Generations are processed in the given order, one after another. The
    /// first failure aborts the run and nothing assembled so far is returned.
    pub async fn assemble(
        mut self,
        vehicles: &[GenerationContext],
        per_generation: u32,
        profile: &ContentTypeProfile,
        cancel: &CancellationToken,
    ) -> Result<AssembledJob, LLMError> {
        let mut job = AssembledJob {
            records: Vec::with_capacity(vehicles.len() * per_generation as usize),
            ..AssembledJob::default()
        };

        for vehicle in vehicles {
            let generated = self
                .generator
                .generate(vehicle, per_generation, profile, &mut self.dedup, cancel)
                .await?;

            job.usage += generated.usage;
            job.generations_processed += 1;
            for question in &generated.questions {
                let record = self.build_record(question, vehicle, profile);
                job.records.push(record);
            }
        }

        tracing::info!(
            "Assembled {} answer requests for {} generations ({} unique questions)",
            job.records.len(),
            job.generations_processed,
            self.dedup.len()
        );

        Ok(job)
    }

    fn build_record(
        &mut self,
        question: &str,
        vehicle: &GenerationContext,
        profile: &ContentTypeProfile,
    ) -> AnswerRequestRecord {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        AnswerRequestRecord {
            custom_id: AnswerRequestRecord::correlation_key(&vehicle.generation_id, sequence),
            method: ANSWER_REQUEST_METHOD.to_string(),
            url: ANSWER_REQUEST_URL.to_string(),
            body: AnswerRequestBody {
                model: self.answer.model.clone(),
                messages: vec![
                    ChatMessage::system(profile.answer_system_prompt()),
                    ChatMessage::user(profile.answer_user_turn(question, vehicle)),
                ],
                temperature: self.answer.sampling.temperature,
                max_tokens: self.answer.sampling.max_tokens,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_wire_shape() {
        let record = AnswerRequestRecord {
            custom_id: AnswerRequestRecord::correlation_key("gen-42", 7),
            method: ANSWER_REQUEST_METHOD.to_string(),
            url: ANSWER_REQUEST_URL.to_string(),
            body: AnswerRequestBody {
                model: "gpt-4o-mini".to_string(),
                messages: vec![ChatMessage::system("sys"), ChatMessage::user("q")],
                temperature: 0.7,
                max_tokens: 2000,
            },
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "custom_id": "answer-gen-42-7",
                "method": "POST",
                "url": "/v1/chat/completions",
                "body": {
                    "model": "gpt-4o-mini",
                    "messages": [
                        { "role": "system", "content": "sys" },
                        { "role": "user", "content": "q" }
                    ],
                    "temperature": 0.7,
                    "max_tokens": 2000
                }
            })
        );
    }
}
