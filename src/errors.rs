//! # Error Types Module
//!
//! Error types shared by the configuration layer and the LLM client.
//! Handlers and startup code wrap these in `anyhow::Error`.

use thiserror::Error;

/// Errors raised while reading configuration at startup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required environment variable is absent or empty
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    /// A variable is present but cannot be parsed
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors produced while talking to a completion endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// The HTTP client could not be constructed
    #[error("client setup error: {0}")]
    ClientSetup(String),
    /// Connect or read timeout for a single attempt
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Transport-level failure other than a timeout
    #[error("transport error: {0}")]
    Transport(String),
    /// The provider answered with a non-success status
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The response envelope did not have the expected shape
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    /// The envelope was valid but carried no completion text
    #[error("provider returned an empty completion")]
    EmptyCompletion,
    /// Every attempt timed out
    #[error("gave up after {attempts} timed out attempts")]
    RetriesExhausted { attempts: u32 },
}
