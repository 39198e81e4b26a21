//! Context window truncation for provider requests.
//!
//! Chooses which suffix of a session's history is sent to the provider. The
//! newest messages are kept, the oldest dropped first, and the result always
//! satisfies both a message-count limit and an estimated token budget.
//!
//! Token cost is estimated, not counted: `chars / chars_per_token` plus a
//! fixed per-message overhead for role metadata. The estimate is pure, so the
//! same history and limits always produce the same window.

use mindforge_types::chat::ChatMessage;
use mindforge_types::config::DispatchConfig;
use mindforge_types::llm::Message;

/// Count and token limits applied to a session history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    pub max_messages: usize,
    pub max_tokens: usize,
    pub chars_per_token: usize,
    pub message_overhead_tokens: usize,
}

/// The truncated history plus bookkeeping for logs.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedHistory<'a> {
    /// Contiguous, chronologically ordered suffix of the input.
    pub messages: &'a [ChatMessage],
    /// Estimated tokens of `messages`.
    pub estimated_tokens: usize,
    /// Messages dropped by the count limit.
    pub dropped_by_count: usize,
    /// Messages dropped by the token budget.
    pub dropped_by_tokens: usize,
}

impl WindowedHistory<'_> {
    /// Whether anything was cut from the original history.
    pub fn truncated(&self) -> bool {
        self.dropped_by_count + self.dropped_by_tokens > 0
    }

    /// Convert the window into provider messages.
    pub fn to_messages(&self) -> Vec<Message> {
        self.messages
            .iter()
            .map(|m| Message::new(m.role, m.content.clone()))
            .collect()
    }
}

impl ContextWindow {
    /// Limits with the default estimator (4 chars per token, 5 tokens overhead).
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        let defaults = DispatchConfig::default();
        Self {
            max_messages,
            max_tokens,
            chars_per_token: defaults.chars_per_token,
            message_overhead_tokens: defaults.message_overhead_tokens,
        }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self {
            max_messages: config.max_context_messages,
            max_tokens: config.max_context_tokens,
            chars_per_token: config.chars_per_token,
            message_overhead_tokens: config.message_overhead_tokens,
        }
    }

    /// Estimated token cost of one message body.
    pub fn estimate_tokens(&self, content: &str) -> usize {
        content.chars().count() / self.chars_per_token.max(1) + self.message_overhead_tokens
    }

    /// Apply both limits to `history` (ordered oldest first).
    ///
    /// May return an empty window when even the newest message is over budget.
    pub fn apply<'a>(&self, history: &'a [ChatMessage]) -> WindowedHistory<'a> {
        let dropped_by_count = history.len().saturating_sub(self.max_messages);
        let recent = &history[dropped_by_count..];

        let mut estimated_tokens = 0;
        let mut kept = 0;
        for msg in recent.iter().rev() {
            let cost = self.estimate_tokens(&msg.content);
            if estimated_tokens + cost > self.max_tokens {
                break;
            }
            estimated_tokens += cost;
            kept += 1;
        }

        let start = recent.len() - kept;
        WindowedHistory {
            messages: &recent[start..],
            estimated_tokens,
            dropped_by_count,
            dropped_by_tokens: start,
        }
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}
