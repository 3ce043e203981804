use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Generation job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse_status(s: &str) -> Self {
        match s {
            "running" => Self::Running,
            "completed" => Self::Completed,
            _ => Self::Failed,
        }
    }
}

/// Row of the `generation_jobs` ledger
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: String,
    pub content_type: String,
    pub language: String,
    pub generation_count: i64,
    pub questions_per_generation: i64,
    pub status: String,
    pub record_count: Option<i64>,
    pub filename: Option<String>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    pub fn status_enum(&self) -> JobStatus {
        JobStatus::parse_status(&self.status)
    }
}

/// Query parameters for `GET /api/generate-questions/jobs`
#[derive(Debug, Clone, Deserialize)]
pub struct ListJobsQuery {
    #[serde(default = "default_job_limit")]
    pub limit: i64,
}

fn default_job_limit() -> i64 {
    50
}
