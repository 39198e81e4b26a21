//! GigaChat adapter.
//!
//! Same chat-completions wire format as the OpenAI-compatible vendors, but
//! the bearer token is short-lived and obtained through an OAuth exchange
//! (see [`credentials`]). A 401 on the chat call invalidates the token and
//! the call is retried exactly once with a freshly exchanged one.

pub mod credentials;

use std::time::Duration;

use mindforge_core::llm::provider::LlmProvider;
use mindforge_types::config::ProviderSettings;
use mindforge_types::llm::{ChatRequest, ChatResponse, LlmError};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;

use self::credentials::TokenManager;
use super::http_client;
use super::openai_compat::config::DEFAULT_REQUEST_TIMEOUT;
use super::openai_compat::wire::{self, SamplingExtras, WireRequest};

pub const DEFAULT_URL: &str = "https://gigachat.devices.sberbank.ru/api/v1/chat/completions";
pub const DEFAULT_OAUTH_URL: &str = "https://ngw.devices.sberbank.ru:9443/api/v2/oauth";
pub const DEFAULT_SCOPE: &str = "GIGACHAT_API_PERS";
pub const DEFAULT_MODEL: &str = "GigaChat";

const SAMPLING: SamplingExtras = SamplingExtras {
    temperature: Some(0.7),
    max_tokens: Some(2000),
};

/// Settings for a [`GigaChatProvider`].
pub struct GigaChatConfig {
    pub url: String,
    pub oauth_url: String,
    pub scope: String,
    pub default_model: String,
    /// Base64 `client_id:client_secret`, exchanged for access tokens.
    pub auth_key: Option<SecretString>,
    /// Pre-issued access token, used as-is when no `auth_key` is set.
    pub access_token: Option<SecretString>,
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl GigaChatConfig {
    pub fn new(auth_key: Option<SecretString>, access_token: Option<SecretString>) -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            oauth_url: DEFAULT_OAUTH_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            auth_key,
            access_token,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            accept_invalid_certs: false,
        }
    }

    /// Apply `[providers.gigachat]` overrides from `config.toml`.
    pub fn with_settings(mut self, settings: &ProviderSettings) -> Self {
        if let Some(url) = &settings.base_url {
            self.url = url.clone();
        }
        if let Some(url) = &settings.oauth_url {
            self.oauth_url = url.clone();
        }
        if let Some(scope) = &settings.scope {
            self.scope = scope.clone();
        }
        if let Some(model) = &settings.default_model {
            self.default_model = model.clone();
        }
        if let Some(secs) = settings.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        self.accept_invalid_certs = settings.accept_invalid_certs;
        self
    }
}

pub struct GigaChatProvider {
    client: reqwest::Client,
    url: String,
    default_model: String,
    tokens: TokenManager,
}

impl GigaChatProvider {
    pub fn new(config: GigaChatConfig) -> Result<Self, LlmError> {
        let client = http_client(config.request_timeout, config.accept_invalid_certs)?;
        let tokens = TokenManager::new(
            client.clone(),
            config.oauth_url,
            config.scope,
            config.auth_key,
            config.access_token,
        );
        Ok(Self {
            client,
            url: config.url,
            default_model: config.default_model,
            tokens,
        })
    }

    /// The adapter's own credential cache.
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }
}

impl LlmProvider for GigaChatProvider {
    fn name(&self) -> &str {
        "gigachat"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    async fn chat(&self, request: &ChatRequest, deadline: Instant) -> Result<ChatResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.default_model.as_str()
        } else {
            request.model.as_str()
        };
        let body = WireRequest::new(model, &request.messages, SAMPLING);
        tracing::debug!(
            provider = "gigachat",
            model,
            messages = request.messages.len(),
            "sending chat completion"
        );

        let mut retried = false;
        loop {
            let token = self.tokens.access_token(deadline).await?;
            let reply = wire::post_chat(
                &self.client,
                &self.url,
                token.expose_secret(),
                &[],
                &body,
                deadline,
            )
            .await?;

            if reply.status == StatusCode::UNAUTHORIZED && !retried && self.tokens.can_refresh() {
                tracing::warn!("GigaChat rejected the access token; refreshing and retrying once");
                self.tokens.invalidate(&token).await;
                retried = true;
                continue;
            }
            return wire::decode_reply(reply);
        }
    }
}
