//! Test doubles shared by the core unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use mindforge_types::chat::{ChatMessage, ChatSession, MessageRole};
use mindforge_types::error::RepositoryError;
use mindforge_types::llm::{ChatRequest, ChatResponse, LlmError, TokenUsage};
use tokio::time::Instant;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::llm::provider::LlmProvider;

#[derive(Clone)]
enum Behavior {
    Reply(String),
    Fail(LlmError),
    Panic,
}

/// Scripted provider that records every request it receives.
pub struct StubProvider {
    name: String,
    default_model: String,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: Arc<Mutex<Vec<ChatRequest>>>,
}

impl StubProvider {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            default_model: format!("{name}-default"),
            behavior,
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(name: &str, content: &str) -> Self {
        Self::with_behavior(name, Behavior::Reply(content.to_string()))
    }

    pub fn failing(name: &str, error: LlmError) -> Self {
        Self::with_behavior(name, Behavior::Fail(error))
    }

    pub fn panicking(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Panic)
    }

    /// Sleep this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the recorded requests; stays valid after the stub is boxed.
    pub fn calls(&self) -> Arc<Mutex<Vec<ChatRequest>>> {
        Arc::clone(&self.calls)
    }
}

impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn chat(&self, request: &ChatRequest, _deadline: Instant) -> Result<ChatResponse, LlmError> {
        self.calls.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.behavior {
            Behavior::Reply(content) => Ok(ChatResponse {
                content: content.clone(),
                model: self.default_model.clone(),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                },
            }),
            Behavior::Fail(err) => Err(err.clone()),
            Behavior::Panic => panic!("stub provider '{}' blew up", self.name),
        }
    }
}

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<Uuid, ChatSession>,
    messages: Vec<ChatMessage>,
    touches: HashMap<Uuid, usize>,
}

/// In-memory [`ChatRepository`].
#[derive(Default)]
pub struct MemoryChatRepository {
    state: Mutex<MemoryState>,
    touch_fails: AtomicBool,
}

impl MemoryChatRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session directly, bypassing the service layer.
    pub fn seed_session(&self, user_id: Uuid, model: &str) -> ChatSession {
        let session = ChatSession::new(user_id, model, "seeded");
        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session.clone());
        session
    }

    /// Insert a message directly.
    pub fn seed_message(&self, session_id: Uuid, role: MessageRole, content: &str) {
        self.state
            .lock()
            .unwrap()
            .messages
            .push(ChatMessage::new(session_id, role, content));
    }

    pub fn messages_for(&self, session_id: Uuid) -> Vec<ChatMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Make every later `touch_session` call fail.
    pub fn fail_touches(&self) {
        self.touch_fails.store(true, Ordering::SeqCst);
    }

    pub fn touch_count(&self, session_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .touches
            .get(&session_id)
            .copied()
            .unwrap_or(0)
    }
}

impl ChatRepository for MemoryChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.contains_key(&session.id) {
            return Err(RepositoryError::Conflict(session.id.to_string()));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.state.lock().unwrap().sessions.get(session_id).cloned())
    }

    async fn list_sessions(&self, user_id: &Uuid) -> Result<Vec<ChatSession>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<ChatSession> = state
            .sessions
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn update_title(&self, session_id: &Uuid, title: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.title = title.to_string();
        session.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.remove(session_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        state.messages.retain(|m| &m.session_id != session_id);
        Ok(())
    }

    async fn load_history(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        Ok(self.messages_for(*session_id))
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if !state.sessions.contains_key(session_id) {
            return Err(RepositoryError::NotFound);
        }
        let message = ChatMessage::new(*session_id, role, content);
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn touch_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        if self.touch_fails.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;
        session.updated_at = Utc::now();
        *state.touches.entry(*session_id).or_default() += 1;
        Ok(())
    }
}
