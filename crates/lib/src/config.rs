//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.biva/config.json`) and environment.
//! Secrets and the assistant identity can be supplied through env so the file can be committed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Who the assistant is and how users may tag it.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Delivery sink that receives formatted replies.
    #[serde(default)]
    pub sink: SinkConfig,

    /// Inbound credential check.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Data backend settings.
    #[serde(default)]
    pub backend: BackendConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 8000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    8000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Assistant identity used for addressing detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    /// Platform user id of the assistant. Overridden by BOT_ID env.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,

    /// Display name users see when tagging the assistant.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Extra alias strings (e.g. "@Quốc Anh"). Added to the built-in tag and bare-name forms.
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_bot_id() -> String {
    "default_bot_id".to_string()
}

fn default_display_name() -> String {
    "BotBiva".to_string()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            bot_id: default_bot_id(),
            display_name: default_display_name(),
            aliases: Vec::new(),
        }
    }
}

impl AssistantConfig {
    /// Effective alias set: `@<botId>`, `@<displayName>`, `<displayName>`, then configured extras.
    /// Blank entries are dropped and duplicates removed case-insensitively, keeping the first spelling.
    pub fn effective_aliases(&self) -> Vec<String> {
        let bot_id = self.bot_id.trim();
        let name = self.display_name.trim();
        let builtin = [
            format!("@{}", bot_id),
            format!("@{}", name),
            name.to_string(),
        ];
        let mut out: Vec<String> = Vec::new();
        for alias in builtin.into_iter().chain(self.aliases.iter().cloned()) {
            let alias = alias.trim().to_string();
            if alias.is_empty() || alias == "@" {
                continue;
            }
            let lower = alias.to_lowercase();
            if out.iter().any(|a| a.to_lowercase() == lower) {
                continue;
            }
            out.push(alias);
        }
        out
    }
}

/// Downstream delivery sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkConfig {
    /// Sink URL. Overridden by SMAX_RESPONSE_WEBHOOK_URL env. Delivery is disabled when unset.
    pub url: Option<String>,

    /// Bearer credential. Overridden by SMAX_TOKEN env.
    pub token: Option<String>,

    /// Per-attempt timeout in seconds (default 10).
    #[serde(default = "default_sink_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sink_timeout_secs() -> u64 {
    10
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: default_sink_timeout_secs(),
        }
    }
}

/// Inbound credential check. Advisory unless `enforce_credential` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// Expected `x-api-key` value. Overridden by SMAX_API_KEY env.
    pub api_key: Option<String>,

    /// When true, requests with a wrong or missing key are rejected with 401 instead of only logged.
    #[serde(default)]
    pub enforce_credential: bool,
}

/// Data backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Timeout for one backend action in seconds (default 5).
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_backend_timeout_secs() -> u64 {
    5
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

/// Trimmed, non-empty env value.
fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the assistant id: env BOT_ID overrides config.
pub fn resolve_bot_id(config: &Config) -> String {
    env_value("BOT_ID").unwrap_or_else(|| config.assistant.bot_id.trim().to_string())
}

/// Resolve the sink URL: env SMAX_RESPONSE_WEBHOOK_URL overrides config.
pub fn resolve_sink_url(config: &Config) -> Option<String> {
    env_value("SMAX_RESPONSE_WEBHOOK_URL").or_else(|| non_empty(config.sink.url.as_ref()))
}

/// Resolve the sink bearer token: env SMAX_TOKEN overrides config.
pub fn resolve_sink_token(config: &Config) -> Option<String> {
    env_value("SMAX_TOKEN").or_else(|| non_empty(config.sink.token.as_ref()))
}

/// Resolve the inbound api key: env SMAX_API_KEY overrides config.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    env_value("SMAX_API_KEY").or_else(|| non_empty(config.auth.api_key.as_ref()))
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Apply env overrides in place so the rest of the process sees one resolved config.
pub fn apply_env_overrides(config: &mut Config) {
    config.assistant.bot_id = resolve_bot_id(config);
    config.sink.url = resolve_sink_url(config);
    config.sink.token = resolve_sink_token(config);
    config.auth.api_key = resolve_api_key(config);
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("BIVA_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".biva").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Env overrides are applied. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    apply_env_overrides(&mut config);
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_port_and_bind() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 8000);
        assert_eq!(g.bind, "127.0.0.1");
    }

    #[test]
    fn empty_json_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.assistant.bot_id, "default_bot_id");
        assert_eq!(config.assistant.display_name, "BotBiva");
        assert_eq!(config.sink.timeout_secs, 10);
        assert_eq!(config.backend.timeout_secs, 5);
        assert!(!config.auth.enforce_credential);
        assert!(config.sink.url.is_none());
    }

    #[test]
    fn camel_case_keys_parse() {
        let config: Config = serde_json::from_str(
            r#"{
                "assistant": { "botId": "bot-1", "displayName": "Quốc Anh", "aliases": ["@QA"] },
                "sink": { "url": "http://sink.local/hook", "token": "t", "timeoutSecs": 3 },
                "auth": { "apiKey": "k", "enforceCredential": true }
            }"#,
        )
        .unwrap();
        assert_eq!(config.assistant.bot_id, "bot-1");
        assert_eq!(config.sink.timeout_secs, 3);
        assert!(config.auth.enforce_credential);
        assert_eq!(config.auth.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn effective_aliases_include_tag_and_bare_forms() {
        let assistant = AssistantConfig {
            bot_id: "bot-1".to_string(),
            display_name: "BotBiva".to_string(),
            aliases: vec!["@Quốc Anh".to_string(), "botbiva".to_string(), "  ".to_string()],
        };
        assert_eq!(
            assistant.effective_aliases(),
            vec!["@bot-1", "@BotBiva", "BotBiva", "@Quốc Anh"]
        );
    }

    #[test]
    fn loopback_binds() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" localhost "));
        assert!(!is_loopback_bind("0.0.0.0"));
    }

    #[test]
    fn blank_config_values_are_unset() {
        let mut config = Config::default();
        config.sink.token = Some("   ".to_string());
        assert_eq!(non_empty(config.sink.token.as_ref()), None);
    }
}
