//! Chat session HTTP handlers.
//!
//! Endpoints:
//! - POST   /api/v1/chats             - Create a chat bound to a model
//! - GET    /api/v1/chats             - List the caller's chats
//! - GET    /api/v1/chats/{id}        - Get one chat
//! - PUT    /api/v1/chats/{id}/title  - Rename a chat
//! - DELETE /api/v1/chats/{id}        - Delete a chat and its messages

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mindforge_types::chat::ChatSession;

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateChatRequest {
    pub ai_model: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameChatRequest {
    pub title: String,
}

/// Wire shape of a chat session.
#[derive(Debug, Serialize)]
pub struct ChatView {
    pub id: Uuid,
    pub ai_model: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChatSession> for ChatView {
    fn from(s: ChatSession) -> Self {
        Self {
            id: s.id,
            ai_model: s.model,
            title: s.title,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// POST /api/v1/chats
pub async fn create_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Json(body): Json<CreateChatRequest>,
) -> Result<ApiResponse<ChatView>, AppError> {
    let clock = RequestClock::start();
    let session = state
        .chat_service
        .create_session(user.id, &body.ai_model, body.title.as_deref())
        .await?;
    Ok(clock.created(session.into()))
}

/// GET /api/v1/chats
pub async fn list_chats(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
) -> Result<ApiResponse<Vec<ChatView>>, AppError> {
    let clock = RequestClock::start();
    let sessions = state.chat_service.list_sessions(user.id).await?;
    Ok(clock.ok(sessions.into_iter().map(ChatView::from).collect()))
}

/// GET /api/v1/chats/{id}
pub async fn get_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<ChatView>, AppError> {
    let clock = RequestClock::start();
    let session = state
        .chat_service
        .get_owned_session(user.id, parse_uuid(&id)?)
        .await?;
    Ok(clock.ok(session.into()))
}

/// PUT /api/v1/chats/{id}/title
pub async fn rename_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    Json(body): Json<RenameChatRequest>,
) -> Result<ApiResponse<ChatView>, AppError> {
    let clock = RequestClock::start();
    let session = state
        .chat_service
        .rename(user.id, parse_uuid(&id)?, &body.title)
        .await?;
    Ok(clock.ok(session.into()))
}

/// DELETE /api/v1/chats/{id}
pub async fn delete_chat(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.chat_service.delete(user.id, parse_uuid(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
