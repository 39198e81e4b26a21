//! Chat service: session lifecycle and user-message persistence on behalf of
//! an authenticated user.
//!
//! Every operation that addresses an existing session goes through
//! [`ChatService::get_owned_session`], so a user can never read or write a
//! session owned by someone else.

use std::sync::Arc;

use mindforge_types::chat::{
    ChatMessage, ChatSession, DEFAULT_TITLE, MessageRole, validate_content, validate_title,
};
use mindforge_types::error::ChatError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;

/// Orchestrates chat session lifecycle and message persistence.
///
/// Generic over `ChatRepository` so mindforge-core never depends on
/// mindforge-infra. The repository is shared with the dispatcher.
pub struct ChatService<C: ChatRepository> {
    repo: Arc<C>,
}

impl<C: ChatRepository> ChatService<C> {
    pub fn new(repo: Arc<C>) -> Self {
        Self { repo }
    }

    /// Access the underlying repository.
    pub fn repo(&self) -> &Arc<C> {
        &self.repo
    }

    /// Create a session bound to `model` for its whole life.
    ///
    /// A missing or blank title falls back to [`DEFAULT_TITLE`].
    pub async fn create_session(
        &self,
        user_id: Uuid,
        model: &str,
        title: Option<&str>,
    ) -> Result<ChatSession, ChatError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ChatError::Validation("ai_model cannot be empty".to_string()));
        }
        let title = match title.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => validate_title(t)?,
            None => DEFAULT_TITLE.to_string(),
        };

        let session = self
            .repo
            .create_session(&ChatSession::new(user_id, model, title))
            .await?;
        info!(session_id = %session.id, user_id = %user_id, model = %session.model, "chat session created");
        Ok(session)
    }

    /// Fetch a session, checking that `user_id` owns it.
    pub async fn get_owned_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<ChatSession, ChatError> {
        let session = self
            .repo
            .get_session(&session_id)
            .await?
            .ok_or(ChatError::NotFound)?;
        if session.user_id != user_id {
            debug!(session_id = %session_id, user_id = %user_id, "session access denied");
            return Err(ChatError::Forbidden);
        }
        Ok(session)
    }

    /// All sessions of a user, most recently active first.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.repo.list_sessions(&user_id).await?)
    }

    pub async fn rename(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        title: &str,
    ) -> Result<ChatSession, ChatError> {
        let title = validate_title(title)?;
        self.get_owned_session(user_id, session_id).await?;
        self.repo.update_title(&session_id, &title).await?;
        self.get_owned_session(user_id, session_id).await
    }

    /// Delete a session together with its messages.
    pub async fn delete(&self, user_id: Uuid, session_id: Uuid) -> Result<(), ChatError> {
        self.get_owned_session(user_id, session_id).await?;
        self.repo.delete_session(&session_id).await?;
        info!(session_id = %session_id, "chat session deleted");
        Ok(())
    }

    /// Durably store a user message and bump the session's activity timestamp.
    ///
    /// Returns the owning session (whose `model` drives the dispatch) and the
    /// stored message. Content is trimmed and must be 1..=10 000 characters.
    pub async fn post_user_message(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        content: &str,
    ) -> Result<(ChatSession, ChatMessage), ChatError> {
        let content = validate_content(content)?;
        let session = self.get_owned_session(user_id, session_id).await?;

        let message = self
            .repo
            .append_message(&session_id, MessageRole::User, &content)
            .await?;
        if let Err(e) = self.repo.touch_session(&session_id).await {
            warn!(session_id = %session_id, error = %e, "user message stored but session touch failed");
        }

        debug!(session_id = %session_id, message_id = %message.id, "user message stored");
        Ok((session, message))
    }

    /// Full message history of an owned session, oldest first.
    pub async fn history(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        self.get_owned_session(user_id, session_id).await?;
        Ok(self.repo.load_history(&session_id).await?)
    }
}
