pub mod job_repository;
pub mod llm;
pub mod question_generation;
pub mod vehicle_repository;

pub use job_repository::JobRepository;
pub use llm::{BatchedCompletionClient, CompletionTransport, LLMError, OpenAITransport, RetryPolicy};
pub use question_generation::{
    AnswerSettings, GenerationError, GeneratorSettings, JsonlFileSink, PersistenceSink,
    QuestionGenerationService, QuestionGenerator,
};
pub use vehicle_repository::VehicleRepository;
