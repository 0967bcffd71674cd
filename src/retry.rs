//! # Retry Policy Module
//!
//! Bounded retry with linear backoff for completion requests. Each attempt
//! reports a typed [`AttemptOutcome`]; only timeouts are retried, every other
//! failure is returned to the caller immediately.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RecoveryConfig;
use crate::errors::LlmError;

/// Result of a single attempt
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Success(T),
    /// Connect or read timeout; eligible for another attempt
    Timeout(LlmError),
    /// Any other failure; never retried
    Failure(LlmError),
}

/// Linear backoff retry policy
///
/// After a timed out attempt `n` (1-based) the policy sleeps `n * step`
/// before attempt `n + 1`, so delays grow strictly with each retry.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub step: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, step: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            step,
        }
    }

    pub fn from_config(config: &RecoveryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.retry_step_ms))
    }

    /// Delay slept after the given failed attempt
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt)
    }

    /// Run `operation` until it succeeds, fails hard, or attempts run out
    ///
    /// `operation` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                AttemptOutcome::Success(value) => {
                    debug!(attempt, "Attempt succeeded");
                    return Ok(value);
                }
                AttemptOutcome::Failure(error) => return Err(error),
                AttemptOutcome::Timeout(error) => {
                    if attempt >= self.max_attempts {
                        warn!(attempt, error = %error, "Giving up after timeout");
                        return Err(LlmError::RetriesExhausted { attempts: attempt });
                    }
                    let delay = self.delay_after(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Attempt timed out, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RecoveryConfig::default())
    }
}
