//! Provider-agnostic LLM request/response types for MindForge.
//!
//! Every vendor adapter translates these shapes to and from its own wire
//! format. Nothing here knows about HTTP.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of characters of a vendor error body kept in
/// [`LlmError::RequestFailed`].
pub const ERROR_BODY_LIMIT: usize = 512;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single turn sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request handed to a provider adapter.
///
/// An empty `model` means "use the adapter's default model".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    pub messages: Vec<Message>,
}

/// Token accounting reported by the vendor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from a provider adapter: the first completion choice only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    /// Model name echoed back by the vendor.
    pub model: String,
    pub usage: TokenUsage,
}

/// Errors from provider registry and adapter operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// A required credential or setting is missing. Raised on first use of
    /// the adapter, never at registry setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("provider not found: '{0}'")]
    ProviderNotFound(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("provider call exceeded its deadline")]
    Timeout,

    #[error("provider request failed with HTTP {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl LlmError {
    /// Build a [`LlmError::RequestFailed`], truncating the body to
    /// [`ERROR_BODY_LIMIT`] characters.
    pub fn request_failed(status: u16, body: &str) -> Self {
        LlmError::RequestFailed {
            status,
            body: truncate_error_body(body),
        }
    }
}

/// Cut a vendor error body to [`ERROR_BODY_LIMIT`] characters, marking the cut.
pub fn truncate_error_body(body: &str) -> String {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
