//! Business logic and port definitions for MindForge.
//!
//! This crate defines the `LlmProvider` and `ChatRepository` ports that the
//! infrastructure layer implements, plus the pure pieces of the AI dispatch
//! subsystem: provider resolution, context-window truncation and the
//! background dispatch orchestrator. It depends only on `mindforge-types`
//! -- never on `mindforge-infra` or any database/HTTP crate.

pub mod chat;
pub mod dispatch;
pub mod llm;

#[cfg(test)]
pub(crate) mod testing;
