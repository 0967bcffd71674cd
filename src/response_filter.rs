//! # Response Filter Module
//!
//! Post-processing of completion text before it reaches the user: reasoning
//! blocks and "search the internet" disclaimers are removed and, when script
//! enforcement is on, letters outside the Cyrillic script are stripped.

use lazy_static::lazy_static;
use regex::Regex;

/// Phrases some providers append instead of (or after) a recipe
pub const UNWANTED_PHRASES: &[&str] = &[
    "Вы можете найти рецепты в интернете",
    "Я могу поискать рецепты",
    "Посмотрите в поиске",
    "Поищите в интернете",
    "Найдите рецепт в интернете",
];

lazy_static! {
    static ref THINK_BLOCK: Regex =
        Regex::new(r"(?s)<think>.*?</think>").expect("Think block pattern should be valid");
    static ref UNWANTED: Regex = Regex::new(&format!(
        "(?i)(?:{})[.!]?",
        UNWANTED_PHRASES
            .iter()
            .map(|phrase| regex::escape(phrase))
            .collect::<Vec<_>>()
            .join("|")
    ))
    .expect("Unwanted phrase pattern should be valid");
    static ref FOREIGN_LETTERS: Regex = Regex::new(r"[\p{L}&&[^\p{Cyrillic}]]+")
        .expect("Foreign letter pattern should be valid");
    static ref SPACE_RUNS: Regex =
        Regex::new(r"[ \t]{2,}").expect("Space run pattern should be valid");
    static ref BLANK_LINES: Regex =
        Regex::new(r"\n{3,}").expect("Blank line pattern should be valid");
}

/// Clean a completion for display
pub fn clean_completion(text: &str, enforce_cyrillic: bool) -> String {
    let mut text = THINK_BLOCK.replace_all(text, "").into_owned();
    text = UNWANTED.replace_all(&text, "").into_owned();
    if enforce_cyrillic {
        text = FOREIGN_LETTERS.replace_all(&text, "").into_owned();
    }
    text = SPACE_RUNS.replace_all(&text, " ").into_owned();

    let cleaned = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_LINES.replace_all(&cleaned, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_disclaimers() {
        let text = "Омлет с сыром.\nПосмотрите в поиске";
        assert_eq!(clean_completion(text, true), "Омлет с сыром.");
    }

    #[test]
    fn test_disclaimer_case_insensitive() {
        let text = "Суп готов. вы можете найти рецепты в интернете.";
        assert_eq!(clean_completion(text, false), "Суп готов.");
    }

    #[test]
    fn test_strips_latin_when_enforced() {
        let text = "Соль 5 g и перец (pepper) по вкусу";
        let cleaned = clean_completion(text, true);
        assert!(!cleaned.contains("pepper"));
        assert!(cleaned.contains("Соль 5"));
        assert!(cleaned.contains("перец () по вкусу"));
    }

    #[test]
    fn test_keeps_latin_when_not_enforced() {
        let text = "Pasta carbonara";
        assert_eq!(clean_completion(text, false), "Pasta carbonara");
    }

    #[test]
    fn test_keeps_digits_and_emoji() {
        let text = "🔥 Шаг 1: 200 г муки";
        assert_eq!(clean_completion(text, true), text);
    }

    #[test]
    fn test_removes_think_block() {
        let text = "<think>reasoning here</think>\nБлины";
        assert_eq!(clean_completion(text, true), "Блины");
    }
}
