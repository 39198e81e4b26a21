//! Dispatch state machine, outcome and error types.

use std::fmt;

use mindforge_types::error::RepositoryError;
use mindforge_types::llm::LlmError;
use uuid::Uuid;

/// Progress of a single dispatch.
///
/// `Queued -> HistoryLoaded -> ContextBuilt -> ProviderResolved ->
/// AwaitingProvider -> {Persisted | Failed}`. Any step may jump to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Queued,
    HistoryLoaded,
    ContextBuilt,
    ProviderResolved,
    AwaitingProvider,
    Persisted,
    Failed,
}

impl DispatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchState::Queued => "queued",
            DispatchState::HistoryLoaded => "history_loaded",
            DispatchState::ContextBuilt => "context_built",
            DispatchState::ProviderResolved => "provider_resolved",
            DispatchState::AwaitingProvider => "awaiting_provider",
            DispatchState::Persisted => "persisted",
            DispatchState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::Persisted | DispatchState::Failed)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a dispatch ended in [`DispatchState::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("session {0} no longer exists")]
    SessionNotFound(Uuid),

    #[error("dispatch deadline exceeded")]
    DeadlineExceeded,

    #[error("dispatch task panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Terminal record of one dispatch. Only used for logs and tests; nothing is
/// reported back to the HTTP caller.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub session_id: Uuid,
    /// Resolved provider name, if resolution was reached.
    pub provider: Option<String>,
    pub state: DispatchState,
    pub error: Option<DispatchError>,
}

impl DispatchOutcome {
    pub fn persisted(session_id: Uuid, provider: String) -> Self {
        Self {
            session_id,
            provider: Some(provider),
            state: DispatchState::Persisted,
            error: None,
        }
    }

    pub fn failed(session_id: Uuid, provider: Option<String>, error: DispatchError) -> Self {
        Self {
            session_id,
            provider,
            state: DispatchState::Failed,
            error: Some(error),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.state == DispatchState::Persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(DispatchState::Persisted.is_terminal());
        assert!(DispatchState::Failed.is_terminal());
        assert!(!DispatchState::AwaitingProvider.is_terminal());
    }

    #[test]
    fn test_error_display_passes_through_llm_error() {
        let err = DispatchError::from(LlmError::Timeout);
        assert_eq!(err.to_string(), "provider call exceeded its deadline");
    }

    #[test]
    fn test_failed_outcome() {
        let id = Uuid::now_v7();
        let outcome = DispatchOutcome::failed(id, None, DispatchError::DeadlineExceeded);
        assert_eq!(outcome.state, DispatchState::Failed);
        assert!(!outcome.is_persisted());
        assert!(outcome.provider.is_none());
    }
}
