//! # AI Kitchen Telegram Bot
//!
//! A Telegram bot that walks the user through a short questionnaire (meal
//! time, cuisine, diet, allergies, ingredients) and asks a language model
//! for a matching recipe.

pub mod bot;
pub mod config;
pub mod diet;
pub mod dialogue;
pub mod errors;
pub mod llm_client;
pub mod llm_provider;
pub mod localization;
pub mod menu;
pub mod messenger;
pub mod prompt;
pub mod response_filter;
pub mod retry;
pub mod session_store;
pub mod throttle;
