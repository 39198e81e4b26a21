//! Provider registry: resolves a session's model string to a provider name
//! and looks up the adapter registered under that name.
//!
//! The registry is assembled once through [`ProviderRegistryBuilder`] and is
//! immutable afterwards; callers share it behind an `Arc`.

use std::collections::HashMap;

use mindforge_types::config::RoutingConfig;
use mindforge_types::llm::LlmError;

use super::box_provider::BoxLlmProvider;

/// A keyword rule: any case-insensitive occurrence of one of `keywords` in
/// the model string selects `provider`.
#[derive(Debug, Clone)]
struct ResolutionRule {
    keywords: Vec<String>,
    provider: String,
}

impl ResolutionRule {
    fn matches(&self, model_lower: &str) -> bool {
        self.keywords.iter().any(|k| model_lower.contains(k.as_str()))
    }
}

/// Registry of vendor adapters, indexed by name.
pub struct ProviderRegistry {
    providers: HashMap<String, BoxLlmProvider>,
    rules: Vec<ResolutionRule>,
    default_provider: String,
}

impl ProviderRegistry {
    /// Start building a registry whose fallback provider is `default_provider`.
    pub fn builder(default_provider: impl Into<String>) -> ProviderRegistryBuilder {
        ProviderRegistryBuilder {
            providers: HashMap::new(),
            rules: Vec::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Map a model string to a registered provider name.
    ///
    /// Rules are checked in registration order; the first match wins. When
    /// nothing matches (including the empty string) the default provider is
    /// returned. Never fails.
    pub fn resolve(&self, model: &str) -> &str {
        let lower = model.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.provider.as_str())
            .unwrap_or(self.default_provider.as_str())
    }

    /// Look up the adapter registered under `name`.
    pub fn get(&self, name: &str) -> Result<&BoxLlmProvider, LlmError> {
        self.providers
            .get(name)
            .ok_or_else(|| LlmError::ProviderNotFound(name.to_string()))
    }

    /// Resolve a model string and return the matching adapter.
    pub fn provider_for_model(&self, model: &str) -> Result<&BoxLlmProvider, LlmError> {
        self.get(self.resolve(model))
    }

    /// Name of the fallback provider.
    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    /// All registered provider names, sorted.
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.list_names())
            .field("rules", &self.rules)
            .field("default_provider", &self.default_provider)
            .finish()
    }
}

/// One-time setup for a [`ProviderRegistry`].
pub struct ProviderRegistryBuilder {
    providers: HashMap<String, BoxLlmProvider>,
    rules: Vec<ResolutionRule>,
    default_provider: String,
}

impl ProviderRegistryBuilder {
    /// Register an adapter under its own [`BoxLlmProvider::name`].
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register(mut self, provider: BoxLlmProvider) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// Append a resolution rule. Keywords are matched case-insensitively;
    /// blank keywords are ignored.
    pub fn rule<I, S>(mut self, keywords: I, provider: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        if !keywords.is_empty() {
            self.rules.push(ResolutionRule {
                keywords,
                provider: provider.into(),
            });
        }
        self
    }

    /// Append every rule from a routing configuration, in order.
    pub fn routing(self, routing: &RoutingConfig) -> Self {
        routing
            .rules
            .iter()
            .fold(self, |builder, rule| builder.rule(&rule.keywords, rule.provider.clone()))
    }

    /// Finish setup.
    ///
    /// Fails with [`LlmError::ProviderNotFound`] when the default provider or
    /// any rule target was never registered, so `resolve` can only ever name
    /// a registered adapter.
    pub fn build(self) -> Result<ProviderRegistry, LlmError> {
        if !self.providers.contains_key(&self.default_provider) {
            return Err(LlmError::ProviderNotFound(self.default_provider));
        }
        if let Some(rule) = self
            .rules
            .iter()
            .find(|rule| !self.providers.contains_key(&rule.provider))
        {
            return Err(LlmError::ProviderNotFound(rule.provider.clone()));
        }

        Ok(ProviderRegistry {
            providers: self.providers,
            rules: self.rules,
            default_provider: self.default_provider,
        })
    }
}
