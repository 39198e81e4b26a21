//! ChatRepository trait definition.
//!
//! Persistence port for chat sessions and their messages. The dispatcher
//! consumes `load_history`, `append_message` and `touch_session`; the rest
//! backs [`ChatService`](super::service::ChatService).

use mindforge_types::chat::{ChatMessage, ChatSession, MessageRole};
use mindforge_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in mindforge-infra (`SqliteChatRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatRepository: Send + Sync {
    /// Insert a new session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Fetch a session by id.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// Sessions owned by `user_id`, most recently active first.
    fn list_sessions(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Replace a session's title. `NotFound` when the session does not exist.
    fn update_title(
        &self,
        session_id: &Uuid,
        title: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a session and, by cascade, all its messages.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Every message of one session, ordered by `created_at` ascending.
    fn load_history(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Append a message to a session and return the stored row.
    fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// Bump the session's `updated_at` to now.
    fn touch_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
