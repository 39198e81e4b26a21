//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `mindforge-core` with raw sqlx queries,
//! private Row structs, and split reader/writer pool usage.

use chrono::Utc;
use mindforge_core::chat::repository::ChatRepository;
use mindforge_types::chat::{ChatMessage, ChatSession, MessageRole};
use mindforge_types::error::RepositoryError;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct ChatSessionRow {
    id: String,
    user_id: String,
    model: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            model: row.try_get("model")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        Ok(ChatSession {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?,
            user_id: Uuid::parse_str(&self.user_id)
                .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?,
            model: self.model,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(ChatMessage {
            id: Uuid::parse_str(&self.id)
                .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?,
            session_id: Uuid::parse_str(&self.session_id)
                .map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))?,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChatSession, RepositoryError> {
    ChatSessionRow::from_row(row)
        .map_err(query_error)?
        .into_session()
}

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chat_sessions (id, user_id, model, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.model)
        .bind(&session.title)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepositoryError::Validation(format!("unknown user {}", session.user_id))
            }
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::Conflict(format!("session {} already exists", session.id))
            }
            other => query_error(other),
        })?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<ChatSession>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_sessions WHERE user_id = ? ORDER BY updated_at DESC, id DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter().map(session_from_row).collect()
    }

    async fn update_title(&self, session_id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET title = ?, updated_at = ? WHERE id = ?")
            .bind(title)
            .bind(format_datetime(&Utc::now()))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn load_history(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(|row| {
                ChatMessageRow::from_row(row)
                    .map_err(query_error)?
                    .into_message()
            })
            .collect()
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let message = ChatMessage::new(*session_id, role, content);
        sqlx::query(
            r#"INSERT INTO chat_messages (id, session_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(session_id.to_string())
        .bind(role.as_str())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| match e {
            // The session was deleted while a dispatch was in flight.
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => RepositoryError::NotFound,
            other => query_error(other),
        })?;

        Ok(message)
    }

    async fn touch_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE chat_sessions SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
