//! Prompt builder for recipe generation.

use crate::diet::{diet_rule, DietCheck};
use crate::dialogue::RecipeRequest;
use crate::menu::DIET_ALLERGIES;

/// System instruction sent with every completion request
pub const SYSTEM_PROMPT: &str = "Ты профессиональный шеф-повар. Генерируй рецепты по запросу. \
Отвечай только на русском языке.";

const STRUCTURE: &[&str] = &[
    "1. Название блюда",
    "2. Кухня",
    "3. Диета",
    "4. Время приготовления",
    "5. Ингредиенты: количество на одну порцию и общее количество",
    "6. Пошаговый рецепт с нумерацией шагов",
    "7. КБЖУ на порцию: калории, белки, жиры, углеводы",
    "8. Советы шеф-повара",
];

/// Compose the user prompt for a finished questionnaire
///
/// Sections always come in the same order: role, output structure, answers,
/// diet clauses, conflicts, closing rules.
pub fn build_prompt(request: &RecipeRequest, check: &DietCheck) -> String {
    let mut prompt = vec![
        "Представь, что ты профессиональный шеф-повар. Сгенерируй рецепт по следующим параметрам.".to_string(),
        String::new(),
        "Строгий формат ответа, разделы строго в этом порядке:".to_string(),
    ];
    prompt.extend(STRUCTURE.iter().map(|line| line.to_string()));

    prompt.push(String::new());
    prompt.push("Параметры:".to_string());
    prompt.push(format!("Приём пищи: {}", request.meal_time));
    prompt.push(format!("Кухня: {}", request.cuisine));
    prompt.push(format!("Диета: {}", request.diet_type));
    prompt.push(format!("Ингредиенты: {}", request.ingredients));

    if let Some(rule) = diet_rule(&request.diet_type) {
        prompt.push(String::new());
        prompt.push(format!("Диетические требования: {}.", rule.description));
        if !rule.forbidden.is_empty() {
            prompt.push(format!("Не используй: {}.", rule.forbidden.join(", ")));
        }
        if !rule.replacements.is_empty() {
            let replacements = rule
                .replacements
                .iter()
                .map(|(original, replacement)| format!("{original} → {replacement}"))
                .collect::<Vec<_>>()
                .join("; ");
            prompt.push(format!("Допустимые замены: {replacements}."));
        }
    }

    if request.diet_type == DIET_ALLERGIES {
        if let Some(allergies) = request.allergies.as_deref() {
            prompt.push(format!("Исключить аллергены: {allergies}."));
        }
    }

    if check.has_conflicts() {
        prompt.push(format!(
            "Эти ингредиенты пользователя не подходят под диету: {}. Замени их подходящими аналогами и укажи замену в списке ингредиентов.",
            check.conflicts.join(", ")
        ));
    }

    prompt.push(String::new());
    prompt.push("Правила:".to_string());
    prompt.push("- Учитывай диетические ограничения".to_string());
    prompt.push("- Используй в основном перечисленные ингредиенты, можно добавить базовые специи".to_string());
    prompt.push("- Пиши только на русском языке".to_string());
    prompt.push("- Никогда не предлагай поискать рецепт в интернете".to_string());

    prompt.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diet::check_diet_conflicts;
    use crate::menu::{DIET_HALAL, DIET_NO_RESTRICTIONS};

    fn request(diet: &str, ingredients: &str, allergies: Option<&str>) -> RecipeRequest {
        RecipeRequest {
            meal_time: "🌇 Обед".to_string(),
            cuisine: "🇮🇹 Итальянская".to_string(),
            diet_type: diet.to_string(),
            allergies: allergies.map(str::to_string),
            ingredients: ingredients.to_string(),
        }
    }

    #[test]
    fn test_sections_in_fixed_order() {
        let prompt = build_prompt(
            &request(DIET_NO_RESTRICTIONS, "паста, томаты", None),
            &DietCheck::default(),
        );

        let positions: Vec<usize> = [
            "шеф-повар",
            "1. Название",
            "4. Время приготовления",
            "5. Ингредиенты",
            "7. КБЖУ",
            "8. Советы",
            "Кухня: 🇮🇹 Итальянская",
            "Ингредиенты: паста, томаты",
            "Никогда не предлагай",
        ]
        .iter()
        .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
        .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_deterministic() {
        let req = request(DIET_HALAL, "свинина, рис", None);
        let check = check_diet_conflicts(&req.ingredients, &req.diet_type, None);
        assert_eq!(build_prompt(&req, &check), build_prompt(&req, &check));
    }

    #[test]
    fn test_halal_clauses_and_conflicts() {
        let req = request(DIET_HALAL, "свинина, рис", None);
        let check = check_diet_conflicts(&req.ingredients, &req.diet_type, None);
        let prompt = build_prompt(&req, &check);

        assert!(prompt.contains("Не используй: свинин"));
        assert!(prompt.contains("свинин → говядина/баранина"));
        assert!(prompt.contains("не подходят под диету: свинина"));
    }

    #[test]
    fn test_allergy_clause() {
        let req = request(DIET_ALLERGIES, "орехи, мёд", Some("арахис, мёд"));
        let prompt = build_prompt(&req, &DietCheck::default());
        assert!(prompt.contains("Исключить аллергены: арахис, мёд."));
        assert!(!prompt.contains("Не используй"));
    }
}
