//! LlmProvider trait definition.
//!
//! This is the core abstraction that all LLM providers implement. The engine
//! treats it as an opaque `chat(messages, options) -> text` capability; the
//! richer request/response shapes exist so adapters can report usage and
//! stop reasons.

use chorus_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Anthropic, OpenAI-compatible, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in chorus-infra (e.g., `AnthropicProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty.
    fn model(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
