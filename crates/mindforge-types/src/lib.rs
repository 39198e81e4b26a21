//! Shared domain types for MindForge.
//!
//! Chat sessions and messages, the provider-agnostic request/response shapes
//! exchanged with vendor adapters, configuration, and the error enums used
//! across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
