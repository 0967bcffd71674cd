//! # Diet Rules Module
//!
//! Static diet rule table and the ingredient conflict checker. Conflicts are
//! plain lower-case substring matches; the checker never blocks generation,
//! its output is shown to the user as a warning and folded into the prompt.

use crate::menu::{
    DIET_ALLERGIES, DIET_HALAL, DIET_HIGH_PROTEIN, DIET_LENTEN, DIET_LOW_CALORIE,
    DIET_NO_RESTRICTIONS,
};

/// Rules attached to one diet label
#[derive(Debug, Clone, PartialEq)]
pub struct DietRule {
    /// Button caption the user picks
    pub label: &'static str,
    /// Free-text description passed to the model
    pub description: &'static str,
    /// Lower-case substrings that mark an ingredient as forbidden
    pub forbidden: &'static [&'static str],
    /// Forbidden substring → suggested replacement, in display order
    pub replacements: &'static [(&'static str, &'static str)],
}

pub static DIET_RULES: &[DietRule] = &[
    DietRule {
        label: DIET_NO_RESTRICTIONS,
        description: "без ограничений",
        forbidden: &[],
        replacements: &[],
    },
    DietRule {
        label: DIET_ALLERGIES,
        description: "исключить аллергены, указанные пользователем",
        forbidden: &[],
        replacements: &[],
    },
    DietRule {
        label: DIET_LOW_CALORIE,
        description: "низкокалорийное блюдо, до 400 ккал на порцию, минимум жира и сахара",
        forbidden: &["сахар", "майонез", "сливки", "сало", "бекон", "сливочное масло", "фритюр"],
        replacements: &[
            ("сахар", "стевия/эритрит"),
            ("майонез", "греческий йогурт"),
            ("сливки", "молоко 1,5%"),
            ("бекон", "индейка"),
            ("сливочное масло", "оливковое масло (в меньшем количестве)"),
        ],
    },
    DietRule {
        label: DIET_HIGH_PROTEIN,
        description: "высокобелковое блюдо, не менее 30 г белка на порцию",
        forbidden: &["сахар", "белый хлеб"],
        replacements: &[
            ("сахар", "стевия"),
            ("белый хлеб", "цельнозерновой хлеб"),
        ],
    },
    DietRule {
        label: DIET_HALAL,
        description: "халяль: без свинины, алкоголя и продуктов из них",
        forbidden: &["свинин", "бекон", "сало", "ветчин", "вино", "пиво", "коньяк", "желатин"],
        replacements: &[
            ("свинин", "говядина/баранина"),
            ("бекон", "говяжий бекон"),
            ("сало", "топлёное говяжье масло"),
            ("ветчин", "индейка"),
            ("вино", "виноградный сок"),
            ("пиво", "безалкогольный бульон"),
            ("желатин", "агар-агар"),
        ],
    },
    DietRule {
        label: DIET_LENTEN,
        description: "постное блюдо: без мяса, птицы, молочных продуктов и яиц",
        forbidden: &[
            "мясо", "говядин", "свинин", "баранин", "куриц", "индейк", "фарш", "колбас",
            "молок", "сливк", "сметан", "творог", "сыр", "яйц", "яйцо", "сливочное масло",
        ],
        replacements: &[
            ("мясо", "грибы/фасоль"),
            ("фарш", "чечевица"),
            ("молок", "овсяное или соевое молоко"),
            ("сметан", "кешью-крем"),
            ("сыр", "тофу"),
            ("яйц", "льняная мука с водой"),
            ("сливочное масло", "растительное масло"),
        ],
    },
];

/// Look up the rule for a diet label
pub fn diet_rule(label: &str) -> Option<&'static DietRule> {
    DIET_RULES.iter().find(|rule| rule.label == label)
}

/// A suggested substitution for a conflicting ingredient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub original: &'static str,
    pub replacement: &'static str,
}

/// Result of checking an ingredient list against a diet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DietCheck {
    /// Conflicting ingredients, lower-cased, in input order (duplicates kept)
    pub conflicts: Vec<String>,
    /// Replacements whose key occurs in at least one conflict
    pub replacements: Vec<Replacement>,
}

impl DietCheck {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Replacement suggestions as `- original → replacement` lines, empty if none
    pub fn replacement_note(&self) -> String {
        self.replacements
            .iter()
            .map(|r| format!("- {} → {}", r.original, r.replacement))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Split a comma-separated list into trimmed lower-case tokens
pub fn split_items(text: &str) -> Vec<String> {
    text.split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Check ingredients against the selected diet
///
/// For the allergy diet the forbidden set is exactly the user's allergy list;
/// for every other known diet it is the table entry. Unknown labels never
/// produce conflicts.
pub fn check_diet_conflicts(ingredients: &str, diet_type: &str, allergies: Option<&str>) -> DietCheck {
    let Some(rule) = diet_rule(diet_type) else {
        return DietCheck::default();
    };

    let forbidden: Vec<String> = if rule.label == DIET_ALLERGIES {
        split_items(allergies.unwrap_or_default())
    } else {
        rule.forbidden.iter().map(|item| item.to_string()).collect()
    };

    let conflicts: Vec<String> = split_items(ingredients)
        .into_iter()
        .filter(|ingredient| forbidden.iter().any(|item| ingredient.contains(item.as_str())))
        .collect();

    let replacements = if conflicts.is_empty() {
        Vec::new()
    } else {
        rule.replacements
            .iter()
            .filter(|(original, _)| conflicts.iter().any(|conflict| conflict.contains(original)))
            .map(|&(original, replacement)| Replacement {
                original,
                replacement,
            })
            .collect()
    };

    DietCheck {
        conflicts,
        replacements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_menu_diet_has_a_rule() {
        for label in crate::menu::DIETS {
            assert!(diet_rule(label).is_some(), "no rule for {label}");
        }
    }

    #[test]
    fn test_forbidden_entries_are_lowercase() {
        for rule in DIET_RULES {
            for item in rule.forbidden {
                assert_eq!(*item, item.to_lowercase());
            }
            for (original, _) in rule.replacements {
                assert_eq!(*original, original.to_lowercase());
            }
        }
    }

    #[test]
    fn test_no_restrictions_never_conflicts() {
        let check = check_diet_conflicts("свинина, сахар, пиво", DIET_NO_RESTRICTIONS, None);
        assert!(!check.has_conflicts());
        assert!(check.replacement_note().is_empty());
    }
}
