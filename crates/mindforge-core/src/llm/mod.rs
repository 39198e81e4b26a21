//! LLM provider abstractions for MindForge.
//!
//! - `LlmProvider`: RPITIT trait for concrete vendor adapters
//! - `BoxLlmProvider`: object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: model-string resolution and name lookup
//! - `ContextWindow`: history truncation by message count and token budget

pub mod box_provider;
pub mod context_window;
pub mod provider;
pub mod registry;
