//! Message Handler module for incoming Telegram messages

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use super::dialogue_manager::{DialogueManager, IncomingMessage};

/// Sender's language code as reported by Telegram
fn language_code(msg: &Message) -> Option<String> {
    msg.from.as_ref().and_then(|user| user.language_code.clone())
}

/// Reduce a text message to the fields the dialogue uses
pub fn to_incoming(msg: &Message) -> Option<IncomingMessage> {
    let text = msg.text()?;
    Some(IncomingMessage {
        chat_id: msg.chat.id,
        user_id: msg.from.as_ref().map(|user| user.id.0),
        text: text.to_string(),
        language_code: language_code(msg),
    })
}

/// Handle one message; the dialogue manager serializes work per chat and
/// runs recipe generation in the background
pub async fn message_handler(msg: Message, manager: Arc<DialogueManager>) -> Result<()> {
    let chat_id = msg.chat.id;
    match to_incoming(&msg) {
        Some(incoming) => {
            debug!(user_id = %chat_id, "Received text message");
            manager.handle_message(incoming).await
        }
        None => {
            debug!(user_id = %chat_id, "Received non-text message");
            let lang = language_code(&msg);
            manager.handle_non_text(chat_id, lang.as_deref()).await
        }
    }
}
