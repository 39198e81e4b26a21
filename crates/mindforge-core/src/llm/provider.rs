//! LlmProvider trait definition.
//!
//! This is the core abstraction that every vendor adapter implements.

use tokio::time::Instant;

use mindforge_types::llm::{ChatRequest, ChatResponse, LlmError};

/// Trait for vendor adapters (OpenRouter, GigaChat, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in mindforge-infra.
pub trait LlmProvider: Send + Sync {
    /// Registry name of the provider (e.g., "openrouter", "gigachat").
    fn name(&self) -> &str;

    /// Model substituted when a request carries an empty `model`.
    fn default_model(&self) -> &str;

    /// Send a chat request and receive the first completion choice.
    ///
    /// Must give up with [`LlmError::Timeout`] once `deadline` passes.
    fn chat(
        &self,
        request: &ChatRequest,
        deadline: Instant,
    ) -> impl std::future::Future<Output = Result<ChatResponse, LlmError>> + Send;
}
