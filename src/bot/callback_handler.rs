//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use tracing::{debug, error};

use super::dialogue_manager::DialogueManager;
use crate::menu::CALLBACK_REGENERATE;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    manager: Arc<DialogueManager>,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Answer first: regeneration can outlive the callback's validity window
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error!(user_id = %q.from.id, error = %e, "Failed to answer callback query");
    }

    let chat_id = q.message.as_ref().map(|msg| msg.chat().id);
    match (q.data.as_deref(), chat_id) {
        (Some(CALLBACK_REGENERATE), Some(chat_id)) => {
            manager.regenerate(chat_id, Some(q.from.id.0)).await?;
        }
        _ => debug!(user_id = %q.from.id, "Ignoring unknown callback"),
    }

    Ok(())
}
