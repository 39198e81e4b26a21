//! Chat session, message and user types for MindForge.
//!
//! A session is bound to one provider/model string for its whole life.
//! Messages are ordered by `created_at` within a session and never mutated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RepositoryError;

// Re-export MessageRole from llm module (it's used in both chat and llm contexts).
pub use crate::llm::MessageRole;

/// Maximum length of a message body, in characters.
pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// Maximum length of a session title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Title given to sessions created without one.
pub const DEFAULT_TITLE: &str = "New chat";

/// An account that owns chat sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A conversation owned by one user.
///
/// `model` is fixed at creation time; every dispatch for this session
/// resolves its provider from this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub model: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Build a fresh session. Both timestamps start at `now`.
    pub fn new(user_id: Uuid, model: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            model: model.into(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single message within a chat session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(session_id: Uuid, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Trim and validate a message body.
///
/// Rejects empty content and content longer than [`MAX_MESSAGE_CHARS`].
pub fn validate_content(content: &str) -> Result<String, RepositoryError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::Validation(
            "message content cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_MESSAGE_CHARS {
        return Err(RepositoryError::Validation(format!(
            "message content too long (max {MAX_MESSAGE_CHARS} characters)"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim and validate a session title (1..=200 characters).
pub fn validate_title(title: &str) -> Result<String, RepositoryError> {
    let trimmed = title.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_TITLE_CHARS {
        return Err(RepositoryError::Validation(format!(
            "title must be between 1 and {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(trimmed.to_string())
}
