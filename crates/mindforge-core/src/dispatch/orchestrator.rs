//! Dispatcher: runs one supervised background task per user message.
//!
//! The request handler calls [`Dispatcher::submit`] right after the user
//! message is stored and returns immediately. The task body runs inside its
//! own spawned task so a panic anywhere in it (repository, adapter) surfaces
//! as a `JoinError` at the supervisor and becomes a `Failed` outcome instead
//! of unwinding into sibling dispatches.
//!
//! Dispatches on the same session are not serialized: two rapid messages can
//! have their replies appended in either order.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use mindforge_types::chat::MessageRole;
use mindforge_types::config::DispatchConfig;
use mindforge_types::llm::ChatRequest;
use tokio::time::{Instant, timeout_at};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Span, debug, error, field, info, info_span, warn};
use uuid::Uuid;

use super::state::{DispatchError, DispatchOutcome, DispatchState};
use crate::chat::repository::ChatRepository;
use crate::llm::context_window::ContextWindow;
use crate::llm::registry::ProviderRegistry;

/// What the request handler hands over after storing a user message.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub session_id: Uuid,
    /// Model string the handler saw. The stored session's model wins.
    pub model: String,
    pub trigger_message_id: Uuid,
}

/// Upper bound on the per-dispatch wall-clock budget.
pub const MAX_DISPATCH_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

struct DispatchRunner<R> {
    repo: Arc<R>,
    registry: Arc<ProviderRegistry>,
    window: ContextWindow,
    timeout: Duration,
}

/// Fire-and-forget dispatch of user messages to their session's provider.
pub struct Dispatcher<R> {
    runner: Arc<DispatchRunner<R>>,
    tracker: TaskTracker,
}

impl<R: ChatRepository + 'static> Dispatcher<R> {
    pub fn new(repo: Arc<R>, registry: Arc<ProviderRegistry>, config: &DispatchConfig) -> Self {
        let mut timeout = Duration::from_secs(config.timeout_secs);
        if timeout > MAX_DISPATCH_TIMEOUT {
            warn!(
                configured_secs = config.timeout_secs,
                max_secs = MAX_DISPATCH_TIMEOUT.as_secs(),
                "dispatch timeout clamped"
            );
            timeout = MAX_DISPATCH_TIMEOUT;
        }
        Self {
            runner: Arc::new(DispatchRunner {
                repo,
                registry,
                window: ContextWindow::from_config(config),
                timeout,
            }),
            tracker: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.runner.registry
    }

    /// Queue a dispatch for a freshly stored user message and return at once.
    ///
    /// There is no result channel; the outcome is only logged.
    pub fn submit(&self, session_id: Uuid, model: impl Into<String>, trigger_message_id: Uuid) {
        let job = DispatchJob {
            session_id,
            model: model.into(),
            trigger_message_id,
        };
        debug!(session_id = %session_id, message_id = %trigger_message_id, "dispatch queued");
        self.tracker.spawn(supervise(Arc::clone(&self.runner), job));
    }

    /// Run one dispatch to completion under supervision and return its outcome.
    pub async fn dispatch(&self, job: DispatchJob) -> DispatchOutcome {
        supervise(Arc::clone(&self.runner), job).await
    }

    /// Number of dispatches still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop tracking new work and wait for every in-flight dispatch to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn supervise<R: ChatRepository + 'static>(
    runner: Arc<DispatchRunner<R>>,
    job: DispatchJob,
) -> DispatchOutcome {
    let session_id = job.session_id;
    let span = info_span!(
        "dispatch",
        session_id = %session_id,
        message_id = %job.trigger_message_id,
        provider = field::Empty,
    );

    let task = tokio::spawn(async move { runner.run(job).await }.instrument(span.clone()));

    match task.await {
        Ok(outcome) => outcome,
        Err(join_error) => {
            let reason = if join_error.is_panic() {
                panic_message(join_error.into_panic())
            } else {
                "task cancelled".to_string()
            };
            span.in_scope(|| {
                error!(state = %DispatchState::Failed, error = %reason, "dispatch task panicked");
            });
            DispatchOutcome::failed(session_id, None, DispatchError::Panicked(reason))
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Await a repository or provider step, bounded by the dispatch deadline.
async fn within<T, E>(
    deadline: Instant,
    step: impl Future<Output = Result<T, E>>,
) -> Result<T, DispatchError>
where
    DispatchError: From<E>,
{
    match timeout_at(deadline, step).await {
        Ok(result) => result.map_err(DispatchError::from),
        Err(_) => Err(DispatchError::DeadlineExceeded),
    }
}

struct Progress {
    state: DispatchState,
    provider: Option<String>,
}

impl Progress {
    fn advance(&mut self, next: DispatchState) {
        debug!(from = %self.state, to = %next, "dispatch state");
        self.state = next;
    }
}

impl<R: ChatRepository> DispatchRunner<R> {
    async fn run(&self, job: DispatchJob) -> DispatchOutcome {
        let session_id = job.session_id;
        let mut progress = Progress {
            state: DispatchState::Queued,
            provider: None,
        };

        match self.execute(&job, &mut progress).await {
            Ok(()) => {
                let provider = progress.provider.unwrap_or_default();
                info!(state = %DispatchState::Persisted, provider = %provider, "dispatch persisted");
                DispatchOutcome::persisted(session_id, provider)
            }
            Err(e) => {
                error!(
                    state = %DispatchState::Failed,
                    failed_at = %progress.state,
                    error = %e,
                    "dispatch failed"
                );
                DispatchOutcome::failed(session_id, progress.provider, e)
            }
        }
    }

    async fn execute(&self, job: &DispatchJob, progress: &mut Progress) -> Result<(), DispatchError> {
        let now = Instant::now();
        let deadline = now.checked_add(self.timeout).unwrap_or(now + MAX_DISPATCH_TIMEOUT);
        let session_id = job.session_id;

        let session = within(deadline, self.repo.get_session(&session_id))
            .await?
            .ok_or(DispatchError::SessionNotFound(session_id))?;
        if session.model != job.model {
            warn!(
                submitted = %job.model,
                stored = %session.model,
                "submitted model differs from session model; using session model"
            );
        }

        let history = within(deadline, self.repo.load_history(&session_id)).await?;
        progress.advance(DispatchState::HistoryLoaded);

        let window = self.window.apply(&history);
        debug!(
            history_count = history.len(),
            context_count = window.messages.len(),
            truncated_count = window.dropped_by_count + window.dropped_by_tokens,
            estimated_tokens = window.estimated_tokens,
            "context window built"
        );
        if window.messages.is_empty() && !history.is_empty() {
            warn!("newest message exceeds the token budget; dispatching empty context");
        }
        progress.advance(DispatchState::ContextBuilt);

        let provider = self.registry.provider_for_model(&session.model)?;
        Span::current().record("provider", provider.name());
        progress.provider = Some(provider.name().to_string());
        progress.advance(DispatchState::ProviderResolved);

        // Empty model: the adapter substitutes its own default.
        let request = ChatRequest {
            model: String::new(),
            messages: window.to_messages(),
        };
        progress.advance(DispatchState::AwaitingProvider);
        let response = within(deadline, provider.chat(&request, deadline)).await?;
        info!(
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            total_tokens = response.usage.total_tokens,
            "provider responded"
        );

        within(
            deadline,
            self.repo
                .append_message(&session_id, MessageRole::Assistant, &response.content),
        )
        .await?;
        if let Err(e) = within(deadline, self.repo.touch_session(&session_id)).await {
            warn!(error = %e, "assistant reply stored but session touch failed");
        }
        progress.advance(DispatchState::Persisted);
        Ok(())
    }
}
