//! Global configuration loader for MindForge.
//!
//! Reads `config.toml` from the data directory (`~/.mindforge/` by default),
//! then layers environment overrides on top. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use mindforge_types::config::GlobalConfig;

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or unparseable file: warning, then the default.
///
/// Environment overrides are not applied here; see [`apply_env_overrides`].
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", config_path.display());
            GlobalConfig::default()
        }
    }
}

/// Apply process environment overrides to `config`.
pub fn apply_env_overrides(config: &mut GlobalConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Recognised keys: `AI_MAX_CONTEXT_MESSAGES`, `AI_MAX_CONTEXT_TOKENS`,
/// `AI_DISPATCH_TIMEOUT_SECS`, `PORT`, `QWEN_API_BASE_URL`. Values that fail
/// to parse are skipped with a warning.
pub fn apply_overrides(config: &mut GlobalConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = parsed(&lookup, "AI_MAX_CONTEXT_MESSAGES") {
        config.dispatch.max_context_messages = v;
    }
    if let Some(v) = parsed(&lookup, "AI_MAX_CONTEXT_TOKENS") {
        config.dispatch.max_context_tokens = v;
    }
    if let Some(v) = parsed(&lookup, "AI_DISPATCH_TIMEOUT_SECS") {
        config.dispatch.timeout_secs = v;
    }
    if let Some(v) = parsed(&lookup, "PORT") {
        config.server.port = v;
    }
    if let Some(url) = lookup("QWEN_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
        config
            .providers
            .entry("qwen".to_string())
            .or_default()
            .base_url = Some(url.trim().to_string());
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

/// Data directory: `MINDFORGE_DATA_DIR`, else `~/.mindforge`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MINDFORGE_DATA_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mindforge")
}
