//! Chat message HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/chats/{id}/messages - Store a user message and queue the AI reply
//! - GET  /api/v1/chats/{id}/messages - Full history, oldest first
//!
//! The assistant reply is produced in the background; clients poll the
//! history endpoint to pick it up.

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mindforge_types::chat::{ChatMessage, MessageRole};

use super::parse_uuid;
use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for MessageView {
    fn from(m: ChatMessage) -> Self {
        Self {
            id: m.id,
            chat_id: m.session_id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub user_message: MessageView,
    /// Always `"processing"`: the reply is dispatched in the background.
    pub status: &'static str,
}

/// POST /api/v1/chats/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> Result<ApiResponse<PostMessageResponse>, AppError> {
    let clock = RequestClock::start();
    let (session, message) = state
        .chat_service
        .post_user_message(user.id, parse_uuid(&id)?, &body.content)
        .await?;

    state.dispatcher.submit(session.id, session.model, message.id);

    Ok(clock.created(PostMessageResponse {
        user_message: message.into(),
        status: "processing",
    }))
}

/// GET /api/v1/chats/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Authenticated(user): Authenticated,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<MessageView>>, AppError> {
    let clock = RequestClock::start();
    let history = state.chat_service.history(user.id, parse_uuid(&id)?).await?;
    Ok(clock.ok(history.into_iter().map(MessageView::from).collect()))
}
