use std::collections::HashMap;

use ai_kitchen_bot::config::{BotConfig, DEFAULT_MIN_INTERVAL_SECS, DEFAULT_WEBHOOK_PORT};
use ai_kitchen_bot::errors::ConfigError;
use ai_kitchen_bot::llm_provider::LlmProvider;

fn load(vars: &[(&str, &str)]) -> Result<BotConfig, ConfigError> {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    BotConfig::from_lookup(|key| env.get(key).cloned())
}

#[test]
fn test_minimal_configuration_uses_defaults() {
    let config = load(&[("TELEGRAM_BOT_TOKEN", "123:abc"), ("GROQ_API_KEY", "gsk")]).unwrap();

    assert_eq!(config.telegram_token, "123:abc");
    assert_eq!(config.llm.provider, LlmProvider::Groq);
    assert_eq!(config.llm.recovery.max_attempts, 3);
    assert_eq!(config.throttle.min_interval_secs, DEFAULT_MIN_INTERVAL_SECS);
    assert!(config.webhook.is_none());
    assert!(!config.maintenance);
}

#[test]
fn test_missing_token_is_reported() {
    let error = load(&[("GROQ_API_KEY", "gsk")]).unwrap_err();
    assert_eq!(error, ConfigError::Missing("TELEGRAM_BOT_TOKEN"));

    // Whitespace-only values count as missing
    let error = load(&[("TELEGRAM_BOT_TOKEN", "  "), ("GROQ_API_KEY", "gsk")]).unwrap_err();
    assert_eq!(error, ConfigError::Missing("TELEGRAM_BOT_TOKEN"));
}

#[test]
fn test_missing_provider_key_is_reported() {
    let error = load(&[("TELEGRAM_TOKEN", "123:abc"), ("LLM_PROVIDER", "openai")]).unwrap_err();
    assert_eq!(error, ConfigError::Missing("OPENAI_API_KEY"));
}

#[test]
fn test_yandex_needs_folder() {
    let error = load(&[
        ("BOT_TOKEN", "123:abc"),
        ("LLM_PROVIDER", "yandexgpt"),
        ("YANDEX_API_KEY", "y"),
    ])
    .unwrap_err();
    assert_eq!(error, ConfigError::Missing("YANDEX_FOLDER_ID"));
}

#[test]
fn test_webhook_and_admins() {
    let config = load(&[
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("GROQ_API_KEY", "gsk"),
        ("WEBHOOK_URL", "https://kitchen.example.com/"),
        ("ADMIN_IDS", "1, 2"),
        ("MAINTENANCE_MODE", "true"),
    ])
    .unwrap();

    let webhook = config.webhook.as_ref().unwrap();
    assert_eq!(webhook.port, DEFAULT_WEBHOOK_PORT);
    assert_eq!(webhook.webhook_url(), "https://kitchen.example.com/webhook");
    assert!(config.admin_ids.contains(&2));
    assert!(!config.admin_ids.contains(&3));
    assert!(config.maintenance);
}

#[test]
fn test_invalid_number_is_rejected() {
    let error = load(&[
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("GROQ_API_KEY", "gsk"),
        ("LLM_TIMEOUT_SECS", "soon"),
    ])
    .unwrap_err();
    assert!(matches!(error, ConfigError::Invalid { key: "LLM_TIMEOUT_SECS", .. }));
}
