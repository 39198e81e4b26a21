//! Infrastructure layer for MindForge.
//!
//! Contains implementations of the ports defined in `mindforge-core`:
//! vendor LLM adapters speaking the OpenAI-compatible wire format (one of
//! them behind an OAuth credential manager), SQLite storage, and the
//! configuration loader.

pub mod config;
pub mod llm;
pub mod sqlite;
