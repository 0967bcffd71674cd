//! # LLM Client Tests
//!
//! Exercises retry, error classification and response parsing against a
//! local mock provider.

use std::time::Duration;

use anyhow::Result;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ai_kitchen_bot::config::LlmConfig;
use ai_kitchen_bot::dialogue::RecipeRequest;
use ai_kitchen_bot::errors::LlmError;
use ai_kitchen_bot::llm_client::{LlmClient, RecipeGenerator};
use ai_kitchen_bot::llm_provider::LlmProvider;
use ai_kitchen_bot::menu::DIET_HALAL;

fn config(server: &MockServer, provider: LlmProvider) -> LlmConfig {
    let mut config = LlmConfig::new(provider, "test-key");
    config.base_url = Some(format!("{}/completion", server.uri()));
    config.recovery.retry_step_ms = 10;
    config
}

fn client(config: LlmConfig, timeout: Duration) -> Result<LlmClient> {
    let http = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(LlmClient::with_http_client(http, config))
}

fn chat_completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
    })
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.map(|r| r.len()).unwrap_or(0)
}

#[tokio::test]
async fn test_groq_completion_is_parsed_and_authorized() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/completion"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({ "model": "llama-3.3-70b-versatile" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("Борщ")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::Groq), Duration::from_secs(5))?;
    let text = client.complete("система", "запрос").await?;

    assert_eq!(text, "Борщ");
    Ok(())
}

#[tokio::test]
async fn test_yandex_completion_is_parsed() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Api-Key test-key"))
        .and(body_partial_json(json!({ "modelUri": "gpt://folder-1/yandexgpt-lite" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "alternatives": [{ "message": { "role": "assistant", "text": "Сырники" }, "status": "ALTERNATIVE_STATUS_FINAL" }],
                "modelVersion": "1"
            }
        })))
        .mount(&server)
        .await;

    let mut config = config(&server, LlmProvider::Yandex);
    config.folder_id = Some("folder-1".to_string());
    config.model = "yandexgpt-lite".to_string();
    let client = client(config, Duration::from_secs(5))?;

    assert_eq!(client.complete("система", "запрос").await?, "Сырники");
    Ok(())
}

#[tokio::test]
async fn test_timeouts_are_retried_three_times() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("поздно"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::Groq), Duration::from_millis(100))?;
    let error = client.complete("система", "запрос").await.unwrap_err();

    assert_eq!(error, LlmError::RetriesExhausted { attempts: 3 });
    assert_eq!(request_count(&server).await, 3);
    Ok(())
}

#[tokio::test]
async fn test_error_status_is_not_retried() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::Groq), Duration::from_secs(5))?;
    let error = client.complete("система", "запрос").await.unwrap_err();

    assert!(matches!(error, LlmError::Status { status: 500, .. }));
    assert_eq!(request_count(&server).await, 1);
    Ok(())
}

#[tokio::test]
async fn test_malformed_envelope() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::OpenAi), Duration::from_secs(5))?;
    let error = client.complete("система", "запрос").await.unwrap_err();

    assert!(matches!(error, LlmError::MalformedResponse(_)));
    Ok(())
}

#[tokio::test]
async fn test_completion_is_filtered() -> Result<()> {
    let server = MockServer::start().await;
    let raw = "<think>plan the answer</think>Рецепт: омлет (omelette).\nПоищите в интернете.";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(raw)))
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::Groq), Duration::from_secs(5))?;
    let text = client.complete("система", "запрос").await?;

    assert_eq!(text, "Рецепт: омлет ().");
    Ok(())
}

#[tokio::test]
async fn test_latin_only_completion_is_empty() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("Sure! Here is your pasta recipe.")),
        )
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::Groq), Duration::from_secs(5))?;
    let result = client.complete("система", "запрос").await;

    assert_eq!(result, Err(LlmError::EmptyCompletion));
    assert_eq!(request_count(&server).await, 1);
    Ok(())
}

#[tokio::test]
async fn test_generate_sends_diet_clauses() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("Плов")))
        .mount(&server)
        .await;

    let client = client(config(&server, LlmProvider::Groq), Duration::from_secs(5))?;
    let request = RecipeRequest {
        meal_time: "🌃 Ужин".to_string(),
        cuisine: "🇹🇷 Турецкая".to_string(),
        diet_type: DIET_HALAL.to_string(),
        allergies: None,
        ingredients: "свинина, рис".to_string(),
    };
    assert_eq!(client.generate(&request).await?, "Плов");

    let requests = server.received_requests().await.unwrap_or_default();
    let body: Value = serde_json::from_slice(&requests[0].body)?;
    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
    assert!(prompt.contains("Не используй: свинин"));
    assert!(prompt.contains("не подходят под диету: свинина"));
    Ok(())
}
