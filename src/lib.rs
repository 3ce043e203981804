//! Faultbase Library
//!
//! Bulk question generation for the vehicle fault knowledge base: vehicle
//! catalog lookups, the LLM batch pipeline and its HTTP surface.

use sqlx::SqlitePool;
use std::sync::Arc;

pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use config::Config;
pub use services::{
    BatchedCompletionClient, GenerationError, JobRepository, LLMError, QuestionGenerationService,
    VehicleRepository,
};

/// Application shared state
///
/// All services are wrapped in Arc for cheap cloning and thread safety.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub question_generation_service: Arc<QuestionGenerationService>,
    pub job_repository: Arc<JobRepository>,
}
