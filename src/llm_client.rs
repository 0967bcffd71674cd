//! # LLM Client Module
//!
//! Sends completion requests to the configured provider with bounded retry
//! on timeouts, then post-filters the completion text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::LlmConfig;
use crate::diet::check_diet_conflicts;
use crate::dialogue::RecipeRequest;
use crate::errors::LlmError;
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::response_filter::clean_completion;
use crate::retry::{AttemptOutcome, RetryPolicy};

/// Produces recipe text for a finished questionnaire
#[async_trait]
pub trait RecipeGenerator: Send + Sync {
    async fn generate(&self, request: &RecipeRequest) -> Result<String, LlmError>;
}

/// HTTP client for one completion provider
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmConfig,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.recovery.operation_timeout_secs))
            .build()
            .map_err(|e| LlmError::ClientSetup(e.to_string()))?;

        Ok(Self::with_http_client(http, config))
    }

    /// Use a pre-built HTTP client (custom timeouts, proxies)
    pub fn with_http_client(http: reqwest::Client, config: LlmConfig) -> Self {
        let retry = RetryPolicy::from_config(&config.recovery);
        Self {
            http,
            config,
            retry,
        }
    }

    /// Request one completion and return the filtered text
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let provider = self.config.provider;
        let body = provider.request_body(
            &self.config.model,
            self.config.folder_id.as_deref(),
            system,
            prompt,
            self.config.temperature,
            self.config.max_tokens,
        );
        let url = self.config.endpoint();

        debug!(
            provider = %provider,
            model = %self.config.model,
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        let raw = self
            .retry
            .run(|attempt| self.send_once(url, &body, attempt))
            .await
            .inspect_err(|e| error!(provider = %provider, error = %e, "Completion request failed"))?;

        info!(provider = %provider, completion_chars = raw.chars().count(), "Completion received");
        let cleaned = clean_completion(&raw, self.config.enforce_cyrillic);
        if !cleaned.chars().any(char::is_alphanumeric) {
            warn!(provider = %provider, "Completion is empty after filtering");
            return Err(LlmError::EmptyCompletion);
        }
        Ok(cleaned)
    }

    async fn send_once(&self, url: &str, body: &Value, attempt: u32) -> AttemptOutcome<String> {
        let provider = self.config.provider;
        let response = match self
            .http
            .post(url)
            .header(AUTHORIZATION, provider.authorization(&self.config.api_key))
            .json(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return AttemptOutcome::Timeout(LlmError::Timeout(e.to_string())),
            Err(e) => return AttemptOutcome::Failure(LlmError::Transport(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(attempt, status = status.as_u16(), "Provider returned an error status");
            return AttemptOutcome::Failure(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = match response.json().await {
            Ok(payload) => payload,
            Err(e) if e.is_timeout() => return AttemptOutcome::Timeout(LlmError::Timeout(e.to_string())),
            Err(e) => return AttemptOutcome::Failure(LlmError::MalformedResponse(e.to_string())),
        };

        match provider.extract_completion(payload) {
            Ok(text) => AttemptOutcome::Success(text),
            Err(e) => AttemptOutcome::Failure(e),
        }
    }
}

#[async_trait]
impl RecipeGenerator for LlmClient {
    async fn generate(&self, request: &RecipeRequest) -> Result<String, LlmError> {
        let check = check_diet_conflicts(
            &request.ingredients,
            &request.diet_type,
            request.allergies.as_deref(),
        );
        let prompt = build_prompt(request, &check);
        self.complete(SYSTEM_PROMPT, &prompt).await
    }
}
