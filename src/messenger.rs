//! Outbound message abstraction.
//!
//! The dialogue manager describes what to send as a [`Reply`]; the Telegram
//! adapter renders the [`Keyboard`] into real markup.

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::ChatId;

/// Keyboard attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Leave the user's current keyboard as is
    Keep,
    /// Hide the reply keyboard (free-text steps)
    Remove,
    MainMenu,
    MealTime,
    Cuisine,
    Diet,
    /// Only the cancel button, shown while a recipe is generated
    CancelOnly,
    /// Inline regenerate/share buttons under a recipe
    RecipeActions,
    /// Inline link to the channel
    ChannelLink(String),
}

/// One outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    /// Plain text that keeps the current keyboard
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, Keyboard::Keep)
    }
}

/// Delivers replies to a chat
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, chat_id: ChatId, reply: Reply) -> Result<()>;
}
