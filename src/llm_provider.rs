//! # LLM Provider Module
//!
//! Wire formats of the supported completion endpoints. Groq and OpenAI share
//! the OpenAI chat-completions envelope; YandexGPT uses its own
//! `foundationModels` envelope and an `Api-Key` authorization scheme.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::LlmError;

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const YANDEX_ENDPOINT: &str =
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion";

/// Completion provider selected by `LLM_PROVIDER`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    OpenAi,
    Yandex,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(self) -> &'static str {
        match self {
            LlmProvider::Groq => "GROQ_API_KEY",
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Yandex => "YANDEX_API_KEY",
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            LlmProvider::Groq => GROQ_ENDPOINT,
            LlmProvider::OpenAi => OPENAI_ENDPOINT,
            LlmProvider::Yandex => YANDEX_ENDPOINT,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Groq => "llama-3.3-70b-versatile",
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Yandex => "yandexgpt-lite",
        }
    }

    /// Value of the `Authorization` header
    pub fn authorization(self, api_key: &str) -> String {
        match self {
            LlmProvider::Groq | LlmProvider::OpenAi => format!("Bearer {api_key}"),
            LlmProvider::Yandex => format!("Api-Key {api_key}"),
        }
    }

    /// Build the JSON request body for one completion call.
    ///
    /// `folder_id` is only consulted for Yandex, where the model is addressed
    /// as `gpt://<folder>/<model>`.
    pub fn request_body(
        self,
        model: &str,
        folder_id: Option<&str>,
        system: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Value {
        let body = match self {
            LlmProvider::Groq | LlmProvider::OpenAi => serde_json::to_value(ChatRequest {
                model,
                messages: vec![
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: prompt,
                    },
                ],
                temperature,
                max_tokens,
            }),
            LlmProvider::Yandex => serde_json::to_value(YandexRequest {
                model_uri: format!("gpt://{}/{}", folder_id.unwrap_or_default(), model),
                completion_options: YandexCompletionOptions {
                    stream: false,
                    temperature,
                    max_tokens,
                },
                messages: vec![
                    YandexMessage {
                        role: "system",
                        text: system,
                    },
                    YandexMessage {
                        role: "user",
                        text: prompt,
                    },
                ],
            }),
        };
        // Plain structs of strings and numbers always serialize
        body.unwrap_or(Value::Null)
    }

    /// Pull the single completion text out of a provider response
    pub fn extract_completion(self, payload: Value) -> Result<String, LlmError> {
        let text = match self {
            LlmProvider::Groq | LlmProvider::OpenAi => {
                let response: ChatResponse = serde_json::from_value(payload)
                    .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
            }
            LlmProvider::Yandex => {
                let response: YandexResponse = serde_json::from_value(payload)
                    .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;
                response
                    .result
                    .alternatives
                    .into_iter()
                    .next()
                    .map(|alternative| alternative.message.text)
            }
        };

        match text {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LlmError::EmptyCompletion),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmProvider::Groq => "groq",
            LlmProvider::OpenAi => "openai",
            LlmProvider::Yandex => "yandex",
        };
        f.write_str(name)
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "openai" => Ok(LlmProvider::OpenAi),
            "yandex" | "yandexgpt" => Ok(LlmProvider::Yandex),
            other => Err(format!("unknown provider '{other}', expected groq, openai or yandex")),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct YandexRequest<'a> {
    model_uri: String,
    completion_options: YandexCompletionOptions,
    messages: Vec<YandexMessage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct YandexCompletionOptions {
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct YandexMessage<'a> {
    role: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct YandexResponse {
    result: YandexResult,
}

#[derive(Deserialize)]
struct YandexResult {
    alternatives: Vec<YandexAlternative>,
}

#[derive(Deserialize)]
struct YandexAlternative {
    message: YandexAlternativeMessage,
}

#[derive(Deserialize)]
struct YandexAlternativeMessage {
    text: String,
}
