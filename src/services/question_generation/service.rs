use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use validator::Validate;

use super::assembler::{AnswerSettings, AssembledJob, BatchJobAssembler};
use super::generator::QuestionGenerator;
use super::profile::ContentTypeProfile;
use super::sink::{ArtifactLabel, PersistenceError, PersistenceSink, StoredArtifact};
use crate::models::{GenerateQuestionsRequest, GenerationContext, JobResult, MAX_TOTAL_QUESTIONS};
use crate::services::job_repository::JobRepository;
use crate::services::llm::LLMError;
use crate::services::vehicle_repository::VehicleRepository;
use crate::utils::{ApiError, StringExt};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Upstream(LLMError),

    #[error("Failed to persist batch file: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generation job cancelled")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

impl From<LLMError> for GenerationError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Cancelled => Self::Cancelled,
            other => Self::Upstream(other),
        }
    }
}

impl From<ApiError> for GenerationError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Validation(msg) => Self::Validation(msg),
            ApiError::NotFound(msg) => Self::NotFound(msg),
            ApiError::Database(e) => Self::Database(e),
            ApiError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Bulk question generation: request in, JSONL batch file out.
pub struct QuestionGenerationService {
    vehicles: Arc<VehicleRepository>,
    jobs: Arc<JobRepository>,
    generator: QuestionGenerator,
    answer: AnswerSettings,
    sink: Arc<dyn PersistenceSink>,
    recent_window: usize,
}

impl QuestionGenerationService {
    pub fn new(
        vehicles: Arc<VehicleRepository>,
        jobs: Arc<JobRepository>,
        generator: QuestionGenerator,
        answer: AnswerSettings,
        sink: Arc<dyn PersistenceSink>,
        recent_window: usize,
    ) -> Self {
        Self { vehicles, jobs, generator, answer, sink, recent_window }
    }

    /// Check request shape and cost bounds. Performs no I/O.
    pub fn validate_request(request: &GenerateQuestionsRequest) -> Result<(), GenerationError> {
        if let Err(errors) = request.validate() {
            let mut messages: Vec<String> = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .map(|e| e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string()))
                .collect();
            messages.sort();
            return Err(GenerationError::Validation(messages.join("; ")));
        }

        if request.brand_ids.iter().any(|id| id.is_blank())
            || request.generation_ids.iter().any(|id| id.is_blank())
        {
            return Err(GenerationError::Validation("Ids must not be blank".to_string()));
        }

        let total = request.total_questions();
        if total > MAX_TOTAL_QUESTIONS {
            return Err(GenerationError::Validation(format!(
                "Total questions ({} generations x {}) = {} exceeds the limit of {}",
                request.generation_ids.len(),
                request.questions_per_generation,
                total,
                MAX_TOTAL_QUESTIONS
            )));
        }

        Ok(())
    }

    /// Run one job end to end.
    ///
    /// Validation and id resolution happen before any upstream call. Any later
    /// failure fails the whole job and leaves no batch file behind.
    pub async fn generate(
        &self,
        request: GenerateQuestionsRequest,
        cancel: CancellationToken,
    ) -> Result<JobResult, GenerationError> {
        Self::validate_request(&request)?;

        let vehicles = self
            .vehicles
            .resolve_generations(&request.brand_ids, &request.generation_ids)
            .await?;

        let job_id = self.jobs.create_job(&request).await?;
        tracing::info!(
            "Job {} started: {} {} questions x {} generations (brands: {})",
            job_id,
            request.questions_per_generation,
            request.content_type.as_str(),
            vehicles.len(),
            request.brand_ids.join(", ")
        );

        let profile = ContentTypeProfile::new(request.content_type, request.language);
        match self.run(&vehicles, &request, &profile, &cancel).await {
            Ok((job, artifact)) => {
                if let Err(e) = self
                    .jobs
                    .complete_job(&job_id, artifact.count, &artifact.filename, job.usage)
                    .await
                {
                    tracing::error!("Job {} could not be closed, discarding {}: {}", job_id, artifact.filename, e);
                    if let Err(discard_err) = self.sink.discard(&artifact).await {
                        tracing::error!("Failed to discard {}: {}", artifact.filename, discard_err);
                    }
                    return Err(e.into());
                }
                tracing::info!(
                    "Job {} completed: {} records in {} (tokens in/out {}/{})",
                    job_id,
                    artifact.count,
                    artifact.filename,
                    job.usage.input_tokens,
                    job.usage.output_tokens
                );

                Ok(JobResult {
                    job_id,
                    file_url: artifact.file_url,
                    filename: artifact.filename,
                    record_count: artifact.count,
                    generations_processed: job.generations_processed,
                    requested_per_generation: request.questions_per_generation,
                    input_tokens: job.usage.input_tokens,
                    output_tokens: job.usage.output_tokens,
                })
            },
            Err(e) => {
                tracing::error!("Job {} failed: {}", job_id, e);
                if let Err(ledger_err) = self.jobs.fail_job(&job_id, &e.to_string()).await {
                    tracing::error!("Failed to mark job {} as failed: {}", job_id, ledger_err);
                }
                Err(e)
            },
        }
    }

    async fn run(
        &self,
        vehicles: &[GenerationContext],
        request: &GenerateQuestionsRequest,
        profile: &ContentTypeProfile,
        cancel: &CancellationToken,
    ) -> Result<(AssembledJob, StoredArtifact), GenerationError> {
        let job = BatchJobAssembler::new(&self.generator, &self.answer, self.recent_window)
            .assemble(vehicles, request.questions_per_generation, profile, cancel)
            .await?;

        if cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        let label = ArtifactLabel {
            content_type: request.content_type,
            generations: vehicles.len(),
            per_generation: request.questions_per_generation,
        };
        let artifact = self.sink.write(&label, &job.records).await?;

        Ok((job, artifact))
    }
}
