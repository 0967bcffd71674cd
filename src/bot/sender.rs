//! Telegram implementation of [`Messenger`].

use anyhow::Result;
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tracing::debug;

use super::ui_builder::{render_keyboard, split_message, MAX_MESSAGE_CHARS};
use crate::messenger::{Messenger, Reply};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send(&self, chat_id: ChatId, reply: Reply) -> Result<()> {
        let chunks = split_message(&reply.text, MAX_MESSAGE_CHARS);
        let last = chunks.len() - 1;
        if last > 0 {
            debug!(user_id = %chat_id, chunks = chunks.len(), "Splitting long message");
        }

        for (index, chunk) in chunks.into_iter().enumerate() {
            let mut request = self.bot.send_message(chat_id, chunk);
            // The keyboard goes with the final chunk only
            if index == last {
                if let Some(markup) = render_keyboard(&reply.keyboard) {
                    request = request.reply_markup(markup);
                }
            }
            request.await?;
        }

        Ok(())
    }
}
