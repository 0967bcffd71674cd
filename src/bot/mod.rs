//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Turns incoming messages into dialogue input
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `dialogue_manager`: Routes input and drives recipe generation
//! - `ui_builder`: Creates keyboards and splits long messages
//! - `sender`: Delivers replies through the Bot API
//! - `webhook`: HTTP endpoint for webhook mode

pub mod callback_handler;
pub mod dialogue_manager;
pub mod message_handler;
pub mod sender;
pub mod ui_builder;
pub mod webhook;

use std::sync::Arc;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::UpdateKind;
use tracing::debug;

pub use callback_handler::callback_handler;
pub use dialogue_manager::{Command, DialogueManager, IncomingMessage, ManagerSettings};
pub use message_handler::message_handler;
pub use sender::TelegramMessenger;

/// Route one decoded update the same way the polling dispatcher does
pub async fn dispatch_update(bot: Bot, manager: Arc<DialogueManager>, update: Update) -> Result<()> {
    match update.kind {
        UpdateKind::Message(msg) => message_handler(msg, manager).await,
        UpdateKind::CallbackQuery(q) => callback_handler(bot, q, manager).await,
        other => {
            debug!(kind = ?other, "Ignoring unsupported update kind");
            Ok(())
        }
    }
}
