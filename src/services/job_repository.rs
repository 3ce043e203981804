//! Generation job ledger

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::models::{GenerateQuestionsRequest, GenerationJob, JobStatus};
use crate::services::llm::TokenUsage;
use crate::utils::{ApiError, ApiResult};

const MAX_LIST_LIMIT: i64 = 200;

pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a ledger row in `running` state and return its id
    pub async fn create_job(&self, request: &GenerateQuestionsRequest) -> ApiResult<String> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"INSERT INTO generation_jobs
               (id, content_type, language, generation_count, questions_per_generation, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(request.content_type.as_str())
        .bind(request.language.as_str())
        .bind(request.generation_ids.len() as i64)
        .bind(i64::from(request.questions_per_generation))
        .bind(JobStatus::Running.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn complete_job(
        &self,
        id: &str,
        record_count: usize,
        filename: &str,
        usage: TokenUsage,
    ) -> ApiResult<()> {
        sqlx::query(
            r#"UPDATE generation_jobs
               SET status = ?, record_count = ?, filename = ?, input_tokens = ?, output_tokens = ?,
                   completed_at = ?
               WHERE id = ?"#,
        )
        .bind(JobStatus::Completed.as_str())
        .bind(record_count as i64)
        .bind(filename)
        .bind(usage.input_tokens)
        .bind(usage.output_tokens)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Failed jobs never carry a filename
    pub async fn fail_job(&self, id: &str, error_message: &str) -> ApiResult<()> {
        sqlx::query(
            r#"UPDATE generation_jobs
               SET status = ?, error_message = ?, filename = NULL, record_count = NULL, completed_at = ?
               WHERE id = ?"#,
        )
        .bind(JobStatus::Failed.as_str())
        .bind(error_message)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_job(&self, id: &str) -> ApiResult<GenerationJob> {
        sqlx::query_as::<_, GenerationJob>("SELECT * FROM generation_jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Job not found: {}", id)))
    }

    /// Most recent first
    pub async fn list_jobs(&self, limit: i64) -> ApiResult<Vec<GenerationJob>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        let jobs = sqlx::query_as::<_, GenerationJob>(
            "SELECT * FROM generation_jobs ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }
}
