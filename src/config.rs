//! # Configuration Module
//!
//! This module defines the configuration structures for the bot, the LLM
//! client, the retry policy and the generation throttle, and loads them from
//! environment variables. Missing required keys are reported as
//! [`ConfigError::Missing`] so that startup can fail fast.

use std::collections::HashSet;
use std::str::FromStr;

use crate::errors::ConfigError;
use crate::llm_provider::LlmProvider;

// Constants for configuration defaults
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_STEP_MS: u64 = 2000;
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 20; // Free-tier requests-per-minute ceiling
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_WEBHOOK_PORT: u16 = 5000;
pub const WEBHOOK_PATH: &str = "/webhook";

const TOKEN_VARS: [&str; 3] = ["TELEGRAM_BOT_TOKEN", "TELEGRAM_TOKEN", "BOT_TOKEN"];

/// Retry configuration for completion requests
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryConfig {
    /// Maximum number of attempts, the first one included
    pub max_attempts: u32,
    /// Backoff step in milliseconds; attempt `n` waits `n * step` before the next try
    pub retry_step_ms: u64,
    /// Timeout for a single HTTP call in seconds
    pub operation_timeout_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_step_ms: DEFAULT_RETRY_STEP_MS,
            operation_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Global pacing of completion requests
#[derive(Debug, Clone, PartialEq)]
pub struct ThrottleConfig {
    /// Minimum seconds between the starts of two consecutive LLM calls
    pub min_interval_secs: u64,
    /// Maximum number of generations admitted (running or waiting) at once
    pub queue_capacity: usize,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: DEFAULT_MIN_INTERVAL_SECS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Completion endpoint configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    /// Model identifier (Yandex: the model part of `modelUri`)
    pub model: String,
    /// Yandex Cloud folder, required for the Yandex provider
    pub folder_id: Option<String>,
    /// Overrides the provider's default endpoint (proxies, tests)
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Strip letters outside the Cyrillic script from completions
    pub enforce_cyrillic: bool,
    pub recovery: RecoveryConfig,
}

impl LlmConfig {
    /// Configuration for a provider with default tuning
    pub fn new(provider: LlmProvider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            folder_id: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            enforce_cyrillic: true,
            recovery: RecoveryConfig::default(),
        }
    }

    /// Endpoint URL the client posts to
    pub fn endpoint(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

/// Webhook delivery settings
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    /// Public base URL; the webhook is registered at `<base_url>/webhook`
    pub base_url: String,
    pub port: u16,
}

impl WebhookConfig {
    pub fn webhook_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), WEBHOOK_PATH)
    }
}

/// Top-level bot configuration
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    pub telegram_token: String,
    pub llm: LlmConfig,
    /// `None` means long polling
    pub webhook: Option<WebhookConfig>,
    pub admin_ids: HashSet<u64>,
    pub channel_link: Option<String>,
    pub debug: bool,
    pub maintenance: bool,
    pub log_json: bool,
    pub throttle: ThrottleConfig,
}

impl BotConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let telegram_token = TOKEN_VARS
            .iter()
            .find_map(|key| get(*key))
            .ok_or(ConfigError::Missing(TOKEN_VARS[0]))?;

        let provider = match get("LLM_PROVIDER") {
            Some(value) => LlmProvider::from_str(&value).map_err(|reason| ConfigError::Invalid {
                key: "LLM_PROVIDER",
                value,
                reason,
            })?,
            None => LlmProvider::Groq,
        };

        let api_key_var = provider.api_key_var();
        let api_key = get(api_key_var).ok_or(ConfigError::Missing(api_key_var))?;

        let mut llm = LlmConfig::new(provider, api_key);
        if provider == LlmProvider::Yandex {
            llm.folder_id = Some(get("YANDEX_FOLDER_ID").ok_or(ConfigError::Missing("YANDEX_FOLDER_ID"))?);
        }
        if let Some(model) = get("LLM_MODEL") {
            llm.model = model;
        }
        llm.base_url = get("LLM_BASE_URL");
        llm.temperature = parse_or("LLM_TEMPERATURE", get("LLM_TEMPERATURE"), DEFAULT_TEMPERATURE)?;
        llm.max_tokens = parse_or("LLM_MAX_TOKENS", get("LLM_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?;
        llm.enforce_cyrillic = parse_flag("LLM_ENFORCE_CYRILLIC", get("LLM_ENFORCE_CYRILLIC"), true)?;
        llm.recovery = RecoveryConfig {
            max_attempts: parse_or("LLM_MAX_ATTEMPTS", get("LLM_MAX_ATTEMPTS"), DEFAULT_MAX_ATTEMPTS)?,
            retry_step_ms: parse_or("LLM_RETRY_STEP_MS", get("LLM_RETRY_STEP_MS"), DEFAULT_RETRY_STEP_MS)?,
            operation_timeout_secs: parse_or(
                "LLM_TIMEOUT_SECS",
                get("LLM_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?,
        };
        if llm.recovery.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "LLM_MAX_ATTEMPTS",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }

        let webhook = match get("WEBHOOK_URL") {
            Some(base_url) => Some(WebhookConfig {
                base_url,
                port: parse_or("WEBHOOK_PORT", get("WEBHOOK_PORT"), DEFAULT_WEBHOOK_PORT)?,
            }),
            None => None,
        };

        let admin_ids = match get("ADMIN_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => HashSet::new(),
        };

        let throttle = ThrottleConfig {
            min_interval_secs: parse_or(
                "LLM_MIN_INTERVAL_SECS",
                get("LLM_MIN_INTERVAL_SECS"),
                DEFAULT_MIN_INTERVAL_SECS,
            )?,
            queue_capacity: parse_or(
                "LLM_QUEUE_CAPACITY",
                get("LLM_QUEUE_CAPACITY"),
                DEFAULT_QUEUE_CAPACITY,
            )?
            .max(1),
        };

        Ok(Self {
            telegram_token,
            llm,
            webhook,
            admin_ids,
            channel_link: get("CHANNEL_LINK"),
            debug: parse_flag("DEBUG", get("DEBUG"), false)?,
            maintenance: parse_flag("MAINTENANCE_MODE", get("MAINTENANCE_MODE"), false)?,
            log_json: get("LOG_FORMAT").is_some_and(|format| format.eq_ignore_ascii_case("json")),
            throttle,
        })
    }
}

/// Read a boolean flag straight from the environment, before full config loading
pub fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(false)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_flag(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match value {
        Some(value) => parse_bool(&value).ok_or_else(|| ConfigError::Invalid {
            key,
            value,
            reason: "expected true or false".to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_admin_ids(raw: &str) -> Result<HashSet<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "ADMIN_IDS",
                value: id.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_defaults_reasonable() {
        let recovery = RecoveryConfig::default();
        assert_eq!(recovery.max_attempts, 3);
        assert!(recovery.retry_step_ms >= 100);
        assert!(recovery.operation_timeout_secs >= 30);
        assert!(recovery.operation_timeout_secs <= 90);
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_webhook_url_joins_path() {
        let webhook = WebhookConfig {
            base_url: "https://kitchen.example.com/".to_string(),
            port: 5000,
        };
        assert_eq!(webhook.webhook_url(), "https://kitchen.example.com/webhook");
    }
}
