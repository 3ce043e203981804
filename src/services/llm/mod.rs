//! LLM Service Module
//!
//! Chat-completion plumbing for bulk content generation.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────┐
//! │ BatchedCompletionClient │  ← retry + timeout + cancellation
//! └────────────┬────────────┘
//!              │
//!       ┌──────┴───────┐
//!       ▼              ▼
//! ┌───────────┐  ┌──────────┐
//! │  OpenAI   │  │   Test   │
//! │ Transport │  │  stubs   │
//! └───────────┘  └──────────┘
//! ```

mod client;
mod completion;
mod models;
mod retry;

pub use client::{CompletionTransport, OpenAITransport};
pub use completion::BatchedCompletionClient;
pub use models::*;
pub use retry::RetryPolicy;

#[cfg(test)]
mod tests;
