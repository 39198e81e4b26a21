//! Configuration types and per-vendor defaults for OpenAI-compatible providers.
//!
//! Each vendor that speaks the chat-completions protocol with a static API
//! key gets a factory function returning an [`OpenAiCompatConfig`] with its
//! endpoint, default model and extra headers.

use std::time::Duration;

use mindforge_types::config::ProviderSettings;
use secrecy::SecretString;

use super::wire::SamplingExtras;

/// Per-request HTTP timeout used when no override is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for an OpenAI-compatible provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Registry name (e.g. "openrouter", "grok").
    pub provider_name: String,
    /// Full chat-completions endpoint URL.
    pub url: String,
    /// Static API key; `None` until the environment provides one.
    pub api_key: Option<SecretString>,
    /// Environment variable named in the error when `api_key` is missing.
    pub api_key_env: &'static str,
    /// Model sent when the request leaves `model` empty.
    pub default_model: String,
    pub extra_headers: Vec<(String, String)>,
    pub sampling: SamplingExtras,
    pub request_timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl OpenAiCompatConfig {
    /// Apply `[providers.<name>]` overrides from `config.toml`.
    pub fn with_settings(mut self, settings: &ProviderSettings) -> Self {
        if let Some(url) = &settings.base_url {
            self.url = url.clone();
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

fn base(
    provider_name: &str,
    url: &str,
    default_model: &str,
    api_key: Option<SecretString>,
    api_key_env: &'static str,
) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: provider_name.into(),
        url: url.into(),
        api_key,
        api_key_env,
        default_model: default_model.into(),
        extra_headers: Vec::new(),
        sampling: SamplingExtras::default(),
        request_timeout: DEFAULT_REQUEST_TIMEOUT,
        accept_invalid_certs: false,
    }
}

/// OpenRouter: `https://openrouter.ai/api/v1/chat/completions`.
///
/// Sends the attribution headers OpenRouter uses for app rankings.
pub fn openrouter_defaults(api_key: Option<SecretString>) -> OpenAiCompatConfig {
    let mut config = base(
        "openrouter",
        "https://openrouter.ai/api/v1/chat/completions",
        "deepseek/deepseek-chat",
        api_key,
        "OPENROUTER_API_KEY",
    );
    config.extra_headers = vec![
        ("HTTP-Referer".into(), "https://mindforge.app".into()),
        ("X-Title".into(), "MindForge".into()),
    ];
    config
}

/// DeepSeek: `https://api.deepseek.com/v1/chat/completions`.
pub fn deepseek_defaults(api_key: Option<SecretString>) -> OpenAiCompatConfig {
    base(
        "deepseek",
        "https://api.deepseek.com/v1/chat/completions",
        "deepseek-chat",
        api_key,
        "DEEPSEEK_API_KEY",
    )
}

/// xAI Grok: `https://api.x.ai/v1/chat/completions`.
pub fn grok_defaults(api_key: Option<SecretString>) -> OpenAiCompatConfig {
    base(
        "grok",
        "https://api.x.ai/v1/chat/completions",
        "grok-beta",
        api_key,
        "GROK_API_KEY",
    )
}

/// Qwen through MuleRouter's OpenAI-compatible gateway.
pub fn qwen_defaults(api_key: Option<SecretString>) -> OpenAiCompatConfig {
    base(
        "qwen",
        "https://api.mulerouter.ai/vendors/openai/v1/chat/completions",
        "qwen3-max",
        api_key,
        "QWEN_API_KEY",
    )
}
