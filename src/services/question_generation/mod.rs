//! Bulk question generation
//!
//! # Flow
//! ```text
//! GenerateQuestionsRequest
//!     │ validate, resolve generation contexts, open ledger row
//!     ▼
//! BatchJobAssembler ── owns dedup set + sequence counter for one job
//!     │ per generation, in request order
//!     ▼
//! QuestionGenerator ── batches of `batch_size` ──► BatchedCompletionClient
//!     │ accepted questions
//!     ▼
//! AnswerRequestRecord* ──► PersistenceSink (JSONL) ──► JobResult
//! ```

mod assembler;
mod dedup;
mod generator;
mod parser;
mod profile;
mod service;
mod sink;

pub use assembler::{
    ANSWER_REQUEST_METHOD, ANSWER_REQUEST_URL, AnswerRequestBody, AnswerRequestRecord, AnswerSettings,
    AssembledJob, BatchJobAssembler,
};
pub use dedup::{DEFAULT_RECENT_WINDOW, QuestionSetDeduplicator};
pub use generator::{GeneratedQuestions, GeneratorSettings, QuestionGenerator, batch_sizes};
pub use parser::parse_question_lines;
pub use profile::ContentTypeProfile;
pub use service::{GenerationError, QuestionGenerationService};
pub use sink::{ArtifactLabel, JsonlFileSink, PersistenceError, PersistenceSink, StoredArtifact, encode_jsonl};
