//! scholarwatch-llm: LLM backend abstraction and article summarization.
//! - `LlmBackend` trait with OpenAI and Ollama implementations
//! - Structured-output schemas and prompt builders
//! - `Summarizer`: per-article assessment and literature-review synthesis

pub mod backend;
pub mod prompts;
pub mod schema;
pub mod summarizer;

pub use backend::{LlmBackend, LlmError, LlmRequest, LlmResponse, Message, ResponseFormat};
pub use summarizer::{LlmSummarizer, Summarizer};
