//! OpenAI-compatible provider with a static bearer API key.
//!
//! A single [`OpenAiCompatibleProvider`] serves OpenRouter, DeepSeek, Grok and
//! Qwen through per-vendor factory functions; the wire format lives in
//! [`wire`] and is shared with the GigaChat adapter.

pub mod config;
pub mod wire;

use mindforge_core::llm::provider::LlmProvider;
use mindforge_types::llm::{ChatRequest, ChatResponse, LlmError};
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use self::config::OpenAiCompatConfig;
use self::wire::{SamplingExtras, WireRequest};
use super::http_client;

/// Unified provider for any OpenAI-compatible API keyed by a static token.
///
/// Does not derive Debug; the key is a [`SecretString`] and is only exposed
/// when building the `Authorization` header.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_name: String,
    url: String,
    api_key: Option<SecretString>,
    api_key_env: &'static str,
    default_model: String,
    extra_headers: Vec<(String, String)>,
    sampling: SamplingExtras,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(config.request_timeout, config.accept_invalid_certs)?,
            provider_name: config.provider_name,
            url: config.url,
            api_key: config.api_key,
            api_key_env: config.api_key_env,
            default_model: config.default_model,
            extra_headers: config.extra_headers,
            sampling: config.sampling,
        })
    }

    pub fn openrouter(api_key: Option<SecretString>) -> Result<Self, LlmError> {
        Self::new(config::openrouter_defaults(api_key))
    }

    pub fn deepseek(api_key: Option<SecretString>) -> Result<Self, LlmError> {
        Self::new(config::deepseek_defaults(api_key))
    }

    pub fn grok(api_key: Option<SecretString>) -> Result<Self, LlmError> {
        Self::new(config::grok_defaults(api_key))
    }

    pub fn qwen(api_key: Option<SecretString>) -> Result<Self, LlmError> {
        Self::new(config::qwen_defaults(api_key))
    }
}

impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.provider_name
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn chat(&self, request: &ChatRequest, deadline: Instant) -> Result<ChatResponse, LlmError> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            LlmError::Configuration(format!("{} is not set", self.api_key_env))
        })?;
        let model = if request.model.is_empty() {
            self.default_model.as_str()
        } else {
            request.model.as_str()
        };

        tracing::debug!(
            provider = %self.provider_name,
            model,
            messages = request.messages.len(),
            "sending chat completion"
        );
        let body = WireRequest::new(model, &request.messages, self.sampling);
        wire::send_chat(
            &self.client,
            &self.url,
            api_key.expose_secret(),
            &self.extra_headers,
            &body,
            deadline,
        )
        .await
    }
}
