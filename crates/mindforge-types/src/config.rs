//! Global configuration types for MindForge.
//!
//! `GlobalConfig` represents the top-level `config.toml`. Every field has a
//! default, so an empty file (or no file at all) yields a working setup.
//! Credentials are never part of this file; they come from the environment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the MindForge backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    /// Per-vendor overrides keyed by provider name (e.g. `gigachat`).
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,

    #[serde(default)]
    pub server: ServerConfig,
}

impl GlobalConfig {
    /// Settings for one provider, or the all-default settings when absent.
    pub fn provider(&self, name: &str) -> ProviderSettings {
        self.providers.get(name).cloned().unwrap_or_default()
    }
}

/// Limits applied to every background dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of history messages sent to a provider.
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Maximum estimated prompt tokens sent to a provider.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Wall-clock budget for one dispatch, from start to persistence.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Characters per estimated token.
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,

    /// Fixed per-message token overhead for role metadata.
    #[serde(default = "default_message_overhead_tokens")]
    pub message_overhead_tokens: usize,
}

fn default_max_context_messages() -> usize {
    100
}

fn default_max_context_tokens() -> usize {
    32_000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_chars_per_token() -> usize {
    4
}

fn default_message_overhead_tokens() -> usize {
    5
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_context_messages: default_max_context_messages(),
            max_context_tokens: default_max_context_tokens(),
            timeout_secs: default_timeout_secs(),
            chars_per_token: default_chars_per_token(),
            message_overhead_tokens: default_message_overhead_tokens(),
        }
    }
}

/// How a session's model string maps to a provider name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Provider used when no rule matches.
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Rules evaluated in order; the first rule with a keyword contained in
    /// the lowercased model string wins.
    #[serde(default = "default_rules")]
    pub rules: Vec<RoutingRule>,
}

/// A single keyword rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    pub keywords: Vec<String>,
    pub provider: String,
}

fn default_provider() -> String {
    "openrouter".to_string()
}

fn default_rules() -> Vec<RoutingRule> {
    let rule = |keywords: &[&str], provider: &str| RoutingRule {
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        provider: provider.to_string(),
    };
    vec![
        rule(&["deepseek", "deep-seek"], "openrouter"),
        rule(&["grok"], "grok"),
        rule(&["gigachat"], "gigachat"),
        rule(&["qwen"], "qwen"),
    ]
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            rules: default_rules(),
        }
    }
}

/// Optional per-vendor overrides. Unset fields fall back to the adapter's
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub request_timeout_secs: Option<u64>,

    /// OAuth token endpoint (token-exchanging vendors only).
    pub oauth_url: Option<String>,
    /// OAuth scope (token-exchanging vendors only).
    pub scope: Option<String>,
    /// Skip TLS certificate verification for vendors with self-signed chains.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
