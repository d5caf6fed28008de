//! Language-model adapters for the dispatch capabilities.
//!
//! An OpenAI-compatible chat-completions backend plus classifier, role and
//! reviewer implementations that prompt it and parse its structured output.

pub mod agents;
pub mod backend;
pub mod error;
pub mod parse;
pub mod prompts;

pub use agents::{LlmClassifier, LlmReviewAgent, LlmRoleAgent};
pub use backend::{ChatBackend, OpenAiBackend, PromptMessage};
pub use error::LlmError;
