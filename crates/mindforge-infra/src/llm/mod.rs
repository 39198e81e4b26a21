//! Vendor adapters and registry assembly.
//!
//! Adapters are always registered, even without credentials; a missing key
//! surfaces as [`LlmError::Configuration`] on first use of that adapter.

pub mod gigachat;
pub mod openai_compat;

use std::time::Duration;

use mindforge_core::llm::box_provider::BoxLlmProvider;
use mindforge_core::llm::registry::ProviderRegistry;
use mindforge_types::config::GlobalConfig;
use mindforge_types::llm::LlmError;
use secrecy::SecretString;

use self::gigachat::{GigaChatConfig, GigaChatProvider};
use self::openai_compat::OpenAiCompatibleProvider;
use self::openai_compat::config;

pub(crate) fn http_client(timeout: Duration, accept_invalid_certs: bool) -> Result<reqwest::Client, LlmError> {
    if accept_invalid_certs {
        tracing::warn!("TLS certificate verification disabled for a provider client");
    }
    reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| LlmError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Build the registry from process environment credentials.
pub fn build_registry(config: &GlobalConfig) -> Result<ProviderRegistry, LlmError> {
    build_registry_with(config, |key| std::env::var(key).ok())
}

/// Build the registry with credentials read through `lookup`.
///
/// Registers openrouter, deepseek, grok, qwen and gigachat, then the routing
/// rules from `config.routing`.
pub fn build_registry_with(
    config: &GlobalConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProviderRegistry, LlmError> {
    let secret = |keys: &[&str]| -> Option<SecretString> {
        keys.iter()
            .filter_map(|k| lookup(k))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .map(SecretString::from)
    };

    let openrouter = config::openrouter_defaults(secret(&["OPENROUTER_API_KEY"]))
        .with_settings(&config.provider("openrouter"));
    let deepseek = config::deepseek_defaults(secret(&["DEEPSEEK_API_KEY"]))
        .with_settings(&config.provider("deepseek"));
    let grok = config::grok_defaults(secret(&["GROK_API_KEY", "XAI_API_KEY"]))
        .with_settings(&config.provider("grok"));
    let qwen = config::qwen_defaults(secret(&["QWEN_API_KEY", "DASHSCOPE_API_KEY"]))
        .with_settings(&config.provider("qwen"));
    let gigachat = GigaChatConfig::new(
        secret(&["GIGACHAT_AUTH_KEY"]),
        secret(&["GIGACHAT_ACCESS_TOKEN", "GIGACHAT_API_KEY"]),
    )
    .with_settings(&config.provider("gigachat"));

    let registry = ProviderRegistry::builder(config.routing.default_provider.clone())
        .register(BoxLlmProvider::new(OpenAiCompatibleProvider::new(openrouter)?))
        .register(BoxLlmProvider::new(OpenAiCompatibleProvider::new(deepseek)?))
        .register(BoxLlmProvider::new(OpenAiCompatibleProvider::new(grok)?))
        .register(BoxLlmProvider::new(OpenAiCompatibleProvider::new(qwen)?))
        .register(BoxLlmProvider::new(GigaChatProvider::new(gigachat)?))
        .routing(&config.routing)
        .build()?;

    tracing::info!(
        providers = ?registry.list_names(),
        default = registry.default_provider(),
        "provider registry ready"
    );
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use mindforge_types::config::{ProviderSettings, RoutingRule};
    use mindforge_types::llm::{ChatRequest, Message, MessageRole};
    use tokio::time::Instant;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn request() -> ChatRequest {
        ChatRequest {
            model: String::new(),
            messages: vec![Message::new(MessageRole::User, "hi")],
        }
    }

    #[test]
    fn test_all_adapters_registered_without_credentials() {
        let registry = build_registry_with(&GlobalConfig::default(), env(&[])).unwrap();
        assert_eq!(
            registry.list_names(),
            vec!["deepseek", "gigachat", "grok", "openrouter", "qwen"]
        );
        assert_eq!(registry.resolve("deepseek-chat"), "openrouter");
        assert_eq!(registry.resolve("grok-beta"), "grok");
        assert_eq!(registry.resolve("GigaChat-Pro"), "gigachat");
        assert_eq!(registry.resolve("qwen3-max"), "qwen");
        assert_eq!(registry.resolve("mystery"), "openrouter");
    }

    #[test]
    fn test_unknown_routing_target_fails() {
        let mut config = GlobalConfig::default();
        config.routing.rules.push(RoutingRule {
            keywords: vec!["claude".into()],
            provider: "anthropic".into(),
        });
        let err = build_registry_with(&config, env(&[])).unwrap_err();
        assert!(matches!(err, LlmError::ProviderNotFound(ref n) if n == "anthropic"));
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_on_use() {
        let registry = build_registry_with(&GlobalConfig::default(), env(&[])).unwrap();
        let grok = registry.get("grok").unwrap();
        let err = grok
            .chat(&request(), Instant::now() + Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Configuration(ref m) if m.contains("GROK_API_KEY")));
    }

    #[tokio::test]
    async fn test_fallback_key_and_settings_are_applied() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer xai-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = GlobalConfig::default();
        config.providers.insert(
            "grok".into(),
            ProviderSettings {
                base_url: Some(format!("{}/v1/chat/completions", server.uri())),
                ..ProviderSettings::default()
            },
        );
        let registry =
            build_registry_with(&config, env(&[("GROK_API_KEY", "  "), ("XAI_API_KEY", "xai-key")]))
                .unwrap();
        let resp = registry
            .provider_for_model("grok-beta")
            .unwrap()
            .chat(&request(), Instant::now() + Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(resp.content, "ok");
    }
}
