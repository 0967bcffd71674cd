//! UI Builder module: turns [`Keyboard`] descriptions into Telegram markup
//! and splits long texts to fit the message size limit.

use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};
use tracing::warn;

use crate::menu::{
    main_menu_layout, step_layout, CALLBACK_REGENERATE, CANCEL, CUISINES, DIETS, MEAL_TIMES,
    OPEN_CHANNEL, REGENERATE, SHARE,
};
use crate::messenger::Keyboard;

/// Telegram rejects messages longer than this many characters
pub const MAX_MESSAGE_CHARS: usize = 4096;

fn reply_keyboard(layout: Vec<Vec<&'static str>>) -> ReplyMarkup {
    let rows = layout
        .into_iter()
        .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());
    KeyboardMarkup::new(rows).resize_keyboard().into()
}

/// Markup for a keyboard, or `None` when the current one should stay
pub fn render_keyboard(keyboard: &Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Remove => Some(KeyboardRemove::new().into()),
        Keyboard::MainMenu => Some(reply_keyboard(main_menu_layout())),
        Keyboard::MealTime => Some(reply_keyboard(step_layout(&MEAL_TIMES))),
        Keyboard::Cuisine => Some(reply_keyboard(step_layout(&CUISINES))),
        Keyboard::Diet => Some(reply_keyboard(step_layout(&DIETS))),
        Keyboard::CancelOnly => Some(reply_keyboard(vec![vec![CANCEL]])),
        Keyboard::RecipeActions => Some(
            InlineKeyboardMarkup::new(vec![vec![
                InlineKeyboardButton::callback(REGENERATE, CALLBACK_REGENERATE),
                InlineKeyboardButton::switch_inline_query(SHARE, ""),
            ]])
            .into(),
        ),
        Keyboard::ChannelLink(link) => match reqwest::Url::parse(link) {
            Ok(url) => Some(
                InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(OPEN_CHANNEL, url)]])
                    .into(),
            ),
            Err(e) => {
                warn!(link = %link, error = %e, "Channel link is not a valid URL");
                None
            }
        },
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Prefers to break after a newline in the second half of a chunk so
/// recipe sections stay intact; falls back to a hard cut on a char boundary.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest: &str = text;

    while rest.chars().count() > max_chars {
        let hard_cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(index, _)| index)
            .unwrap_or(rest.len());
        let window = &rest[..hard_cut];
        let cut = match window.rfind('\n') {
            Some(newline) if newline >= hard_cut / 2 => newline + 1,
            _ => hard_cut,
        };
        chunks.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_single_chunk() {
        assert_eq!(split_message("рецепт", MAX_MESSAGE_CHARS), vec!["рецепт"]);
    }

    #[test]
    fn test_split_respects_char_limit() {
        let text = "я".repeat(10_000);
        let chunks = split_message(&text, MAX_MESSAGE_CHARS);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_MESSAGE_CHARS));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_split_prefers_newlines() {
        let text = format!("{}\n{}", "а".repeat(8), "б".repeat(8));
        let chunks = split_message(&text, 10);
        assert_eq!(chunks[0], format!("{}\n", "а".repeat(8)));
        assert_eq!(chunks[1], "б".repeat(8));
    }

    #[test]
    fn test_keep_has_no_markup() {
        assert!(render_keyboard(&Keyboard::Keep).is_none());
        assert!(render_keyboard(&Keyboard::MainMenu).is_some());
        assert!(render_keyboard(&Keyboard::ChannelLink("not a url".into())).is_none());
        assert!(render_keyboard(&Keyboard::ChannelLink("https://t.me/kitchen".into())).is_some());
    }
}
