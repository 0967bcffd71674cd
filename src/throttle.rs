//! # Generation Throttle Module
//!
//! Global pacing for completion requests plus per-chat in-flight flags.
//!
//! # Model
//!
//! - **Admission**: a semaphore sized by `queue_capacity` bounds how many
//!   generations may be running or waiting; overflow is rejected outright.
//! - **Serialization**: a FIFO mutex lets one LLM call run at a time, and the
//!   next call starts no sooner than `min_interval` after the previous start.
//! - **Per-chat flag**: a chat holds at most one [`ActiveRequest`]. The flag
//!   carries a ticket so that a cancelled request's guard cannot clear the
//!   flag of a newer request from the same chat.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use teloxide::types::ChatId;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::config::ThrottleConfig;

type ActiveMap = Arc<Mutex<HashMap<ChatId, u64>>>;

/// Why a generation was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleRejection {
    /// The chat already has a request in flight
    Busy,
    /// The global queue is full
    QueueFull,
}

#[derive(Debug)]
pub struct GenerationThrottle {
    active: ActiveMap,
    next_ticket: AtomicU64,
    admission: Arc<Semaphore>,
    last_start: tokio::sync::Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl GenerationThrottle {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self {
            active: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(1),
            admission: Arc::new(Semaphore::new(config.queue_capacity.max(1))),
            last_start: tokio::sync::Mutex::new(None),
            min_interval: Duration::from_secs(config.min_interval_secs),
        }
    }

    /// Register a generation for `chat_id`
    pub fn begin(&self, chat_id: ChatId) -> Result<ActiveRequest, ThrottleRejection> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.contains_key(&chat_id) {
            return Err(ThrottleRejection::Busy);
        }

        let permit = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|_| ThrottleRejection::QueueFull)?;

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        active.insert(chat_id, ticket);
        debug!(user_id = %chat_id, ticket, "Generation admitted");

        Ok(ActiveRequest {
            chat_id,
            ticket,
            active: Arc::clone(&self.active),
            _permit: permit,
        })
    }

    /// Whether `chat_id` has a generation in flight
    pub fn is_active(&self, chat_id: ChatId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&chat_id)
    }

    /// Clear the chat's in-flight flag; the running call is not aborted
    pub fn cancel(&self, chat_id: ChatId) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&chat_id)
            .is_some()
    }

    /// Number of chats with a generation in flight
    pub fn in_flight(&self) -> usize {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Run `call` once it is this request's turn
    pub async fn run<F>(&self, call: F) -> F::Output
    where
        F: Future,
    {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Pacing completion request");
                tokio::time::sleep(wait).await;
            }
        }
        *last_start = Some(Instant::now());
        call.await
    }
}

/// In-flight marker for one chat; dropping it clears the flag
#[derive(Debug)]
pub struct ActiveRequest {
    chat_id: ChatId,
    ticket: u64,
    active: ActiveMap,
    _permit: OwnedSemaphorePermit,
}

impl ActiveRequest {
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// True once the flag was cleared by [`GenerationThrottle::cancel`]
    pub fn is_cancelled(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.chat_id)
            != Some(&self.ticket)
    }
}

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.get(&self.chat_id) == Some(&self.ticket) {
            active.remove(&self.chat_id);
        }
    }
}
