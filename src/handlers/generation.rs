//! Question Generation API Handlers
//!
//! Bulk question generation and the job ledger.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::AppState;
use crate::models::{GenerateQuestionsRequest, GenerateQuestionsResponse, GenerationJob, ListJobsQuery};
use crate::services::question_generation::GenerationError;
use crate::utils::ApiResult;

// ============================================================================
// Generation API
// ============================================================================

/// Generate questions for vehicle generations and write a JSONL batch file
/// POST /api/generate-questions
///
/// The job runs on its own task. If the client goes away, the job is cancelled
/// and cleans up after itself instead of being dropped mid-write.
#[utoipa::path(
    post,
    path = "/api/generate-questions",
    request_body = GenerateQuestionsRequest,
    responses(
        (status = 200, description = "Batch file written", body = GenerateQuestionsResponse),
        (status = 400, description = "Malformed or out-of-range request"),
        (status = 404, description = "Unknown brand or generation id"),
        (status = 500, description = "Upstream LLM or storage failure"),
        (status = 503, description = "Job cancelled")
    ),
    tag = "Question Generation"
)]
pub async fn generate_questions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateQuestionsRequest>, JsonRejection>,
) -> Result<Json<GenerateQuestionsResponse>, GenerationApiError> {
    let Json(request) = payload.map_err(|e| GenerationError::Validation(e.body_text()))?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let service = Arc::clone(&state.question_generation_service);
    let result = tokio::spawn(async move { service.generate(request, cancel).await })
        .await
        .map_err(|e| GenerationError::Internal(format!("Generation task failed: {}", e)))??;

    Ok(Json(GenerateQuestionsResponse::from(result)))
}

// ============================================================================
// Job Ledger API
// ============================================================================

/// List recent generation jobs
/// GET /api/generate-questions/jobs
#[utoipa::path(
    get,
    path = "/api/generate-questions/jobs",
    params(
        ("limit" = Option<i64>, Query, description = "Maximum number of jobs (1-200, default 50)")
    ),
    responses(
        (status = 200, description = "Most recent jobs first", body = Vec<GenerationJob>)
    ),
    tag = "Question Generation"
)]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<Vec<GenerationJob>>> {
    let jobs = state.job_repository.list_jobs(query.limit).await?;
    Ok(Json(jobs))
}

/// Get one generation job
/// GET /api/generate-questions/jobs/:id
#[utoipa::path(
    get,
    path = "/api/generate-questions/jobs/{id}",
    params(
        ("id" = String, Path, description = "Job id")
    ),
    responses(
        (status = 200, description = "Job details", body = GenerationJob),
        (status = 404, description = "Job not found")
    ),
    tag = "Question Generation"
)]
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<GenerationJob>> {
    let job = state.job_repository.get_job(&id).await?;
    Ok(Json(job))
}

// ============================================================================
// Error Handling
// ============================================================================

/// API error wrapper for generation failures
pub struct GenerationApiError(GenerationError);

impl From<GenerationError> for GenerationApiError {
    fn from(err: GenerationError) -> Self {
        Self(err)
    }
}

impl GenerationApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
            GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
            GenerationError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            GenerationError::Upstream(_)
            | GenerationError::Persistence(_)
            | GenerationError::Database(_)
            | GenerationError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GenerationApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        match &self.0 {
            GenerationError::Validation(msg) | GenerationError::NotFound(msg) => {
                tracing::warn!("Rejected generation request: {}", msg)
            },
            other => tracing::error!("Question generation failed: {}", other),
        }

        (status, Json(serde_json::json!({ "error": self.0.to_string() }))).into_response()
    }
}
