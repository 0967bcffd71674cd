//! Keyed conversation store.
//!
//! The dialogue manager only sees the [`SessionStore`] trait; the adapter
//! decides which implementation to inject. Records live for the process
//! lifetime unless cleared.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use teloxide::types::ChatId;
use tokio::sync::Mutex;

use crate::dialogue::ChatSession;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: ChatId) -> Option<ChatSession>;
    async fn set(&self, chat_id: ChatId, session: ChatSession);
    async fn clear(&self, chat_id: ChatId);
    async fn len(&self) -> usize;
}

/// Process-local store backed by a mutex-guarded map
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<ChatId, ChatSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat_id: ChatId) -> Option<ChatSession> {
        self.sessions.lock().await.get(&chat_id).cloned()
    }

    async fn set(&self, chat_id: ChatId, mut session: ChatSession) {
        session.updated_at = Utc::now();
        self.sessions.lock().await.insert(chat_id, session);
    }

    async fn clear(&self, chat_id: ChatId) {
        self.sessions.lock().await.remove(&chat_id);
    }

    async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
