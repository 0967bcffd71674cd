//! Recipe dialogue module: conversation steps, the per-chat record and the
//! step → handler table that drives the questionnaire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::localization::{t_args_lang, t_lang};
use crate::menu::{find_option, CUISINES, DIETS, DIET_ALLERGIES, MEAL_TIMES};
use crate::messenger::{Keyboard, Reply};

pub const MAX_ALLERGIES_LEN: usize = 300;
pub const MAX_INGREDIENTS_LEN: usize = 1000;

/// Position of a chat in the fixed question sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConversationStep {
    #[default]
    Idle,
    WaitingMealTime,
    WaitingCuisine,
    WaitingDiet,
    WaitingAllergies,
    WaitingIngredients,
    Done,
}

impl ConversationStep {
    /// `Idle` and `Done` both mean "no questionnaire in progress"
    pub fn is_idle(self) -> bool {
        matches!(self, ConversationStep::Idle | ConversationStep::Done)
    }
}

/// Conversation record of one chat
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub step: ConversationStep,
    pub meal_time: Option<String>,
    pub cuisine: Option<String>,
    pub diet_type: Option<String>,
    pub allergies: Option<String>,
    pub ingredients: Option<String>,
    pub language_code: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            step: ConversationStep::Idle,
            meal_time: None,
            cuisine: None,
            diet_type: None,
            allergies: None,
            ingredients: None,
            language_code: None,
            updated_at: Utc::now(),
        }
    }
}

impl ChatSession {
    /// Fresh record positioned at the first question
    pub fn start(language_code: Option<String>) -> (Self, Reply) {
        let session = Self {
            step: ConversationStep::WaitingMealTime,
            language_code,
            ..Self::default()
        };
        let reply = Reply::new(
            t_lang("ask-meal-time", session.lang()),
            Keyboard::MealTime,
        );
        (session, reply)
    }

    pub fn lang(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    /// The completed answer set, if every required answer is present
    pub fn to_request(&self) -> Option<RecipeRequest> {
        Some(RecipeRequest {
            meal_time: self.meal_time.clone()?,
            cuisine: self.cuisine.clone()?,
            diet_type: self.diet_type.clone()?,
            allergies: self.allergies.clone(),
            ingredients: self.ingredients.clone()?,
        })
    }
}

/// Answers collected by a finished questionnaire
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub meal_time: String,
    pub cuisine: String,
    pub diet_type: String,
    pub allergies: Option<String>,
    pub ingredients: String,
}

/// What a step handler decided
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Store the updated record and send the next question
    Advance { session: ChatSession, reply: Reply },
    /// Input rejected; the record stays as it was
    Reprompt(Reply),
    /// Ingredients accepted; the record is ready for generation
    Submit(ChatSession),
}

/// Handler for one conversation step
pub type StepHandler = fn(ChatSession, &str) -> Transition;

/// Step → handler table; idle steps have no handler
pub fn handler_for(step: ConversationStep) -> Option<StepHandler> {
    match step {
        ConversationStep::WaitingMealTime => Some(on_meal_time),
        ConversationStep::WaitingCuisine => Some(on_cuisine),
        ConversationStep::WaitingDiet => Some(on_diet),
        ConversationStep::WaitingAllergies => Some(on_allergies),
        ConversationStep::WaitingIngredients => Some(on_ingredients),
        ConversationStep::Idle | ConversationStep::Done => None,
    }
}

/// Validates a free-text answer
pub fn validate_free_text(text: &str, max_len: usize) -> Result<String, &'static str> {
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > max_len {
        return Err("too_long");
    }

    Ok(trimmed.to_string())
}

fn choose_again(session: &ChatSession, keyboard: Keyboard) -> Transition {
    Transition::Reprompt(Reply::new(t_lang("choose-from-buttons", session.lang()), keyboard))
}

fn free_text_error(session: &ChatSession, error: &str, max_len: usize) -> Transition {
    let max = max_len.to_string();
    let text = match error {
        "too_long" => t_args_lang("input-too-long", &[("max", max.as_str())], session.lang()),
        _ => t_lang("input-empty", session.lang()),
    };
    Transition::Reprompt(Reply::new(text, Keyboard::Keep))
}

fn on_meal_time(mut session: ChatSession, text: &str) -> Transition {
    let Some(choice) = find_option(&MEAL_TIMES, text) else {
        return choose_again(&session, Keyboard::MealTime);
    };

    session.meal_time = Some(choice.to_string());
    session.step = ConversationStep::WaitingCuisine;
    let reply = Reply::new(t_lang("ask-cuisine", session.lang()), Keyboard::Cuisine);
    Transition::Advance { session, reply }
}

fn on_cuisine(mut session: ChatSession, text: &str) -> Transition {
    let Some(choice) = find_option(&CUISINES, text) else {
        return choose_again(&session, Keyboard::Cuisine);
    };

    session.cuisine = Some(choice.to_string());
    session.step = ConversationStep::WaitingDiet;
    let reply = Reply::new(t_lang("ask-diet", session.lang()), Keyboard::Diet);
    Transition::Advance { session, reply }
}

fn on_diet(mut session: ChatSession, text: &str) -> Transition {
    let Some(choice) = find_option(&DIETS, text) else {
        return choose_again(&session, Keyboard::Diet);
    };

    session.diet_type = Some(choice.to_string());
    let key = if choice == DIET_ALLERGIES {
        session.step = ConversationStep::WaitingAllergies;
        "ask-allergies"
    } else {
        session.allergies = None;
        session.step = ConversationStep::WaitingIngredients;
        "ask-ingredients"
    };
    let reply = Reply::new(t_lang(key, session.lang()), Keyboard::Remove);
    Transition::Advance { session, reply }
}

fn on_allergies(mut session: ChatSession, text: &str) -> Transition {
    match validate_free_text(text, MAX_ALLERGIES_LEN) {
        Ok(allergies) => {
            session.allergies = Some(allergies);
            session.step = ConversationStep::WaitingIngredients;
            let reply = Reply::new(
                t_lang("ask-ingredients-after-allergies", session.lang()),
                Keyboard::Remove,
            );
            Transition::Advance { session, reply }
        }
        Err(error) => free_text_error(&session, error, MAX_ALLERGIES_LEN),
    }
}

fn on_ingredients(mut session: ChatSession, text: &str) -> Transition {
    match validate_free_text(text, MAX_INGREDIENTS_LEN) {
        Ok(ingredients) => {
            session.ingredients = Some(ingredients);
            Transition::Submit(session)
        }
        Err(error) => free_text_error(&session, error, MAX_INGREDIENTS_LEN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_validation() {
        assert!(validate_free_text("рис, курица", 100).is_ok());
        assert_eq!(validate_free_text("   ", 100), Err("empty"));
        assert_eq!(validate_free_text(&"я".repeat(101), 100), Err("too_long"));
        // Length is counted in characters, not bytes
        assert!(validate_free_text(&"я".repeat(100), 100).is_ok());
    }

    #[test]
    fn test_free_text_trimming() {
        assert_eq!(validate_free_text("  рис  ", 10).unwrap(), "рис");
    }

    #[test]
    fn test_idle_steps_have_no_handler() {
        assert!(handler_for(ConversationStep::Idle).is_none());
        assert!(handler_for(ConversationStep::Done).is_none());
        assert!(handler_for(ConversationStep::WaitingDiet).is_some());
    }

    #[test]
    fn test_to_request_requires_all_answers() {
        let mut session = ChatSession::default();
        assert!(session.to_request().is_none());

        session.meal_time = Some("🌇 Обед".to_string());
        session.cuisine = Some("🇮🇹 Итальянская".to_string());
        session.diet_type = Some("🚫 Нет ограничений".to_string());
        assert!(session.to_request().is_none());

        session.ingredients = Some("паста, томаты".to_string());
        let request = session.to_request().unwrap();
        assert_eq!(request.ingredients, "паста, томаты");
        assert!(request.allergies.is_none());
    }
}
