use ai_kitchen_bot::diet::{check_diet_conflicts, split_items, Replacement};
use ai_kitchen_bot::menu::{DIET_ALLERGIES, DIET_HALAL, DIET_LENTEN, DIET_LOW_CALORIE};

#[test]
fn test_halal_pork_conflict_with_replacement() {
    let check = check_diet_conflicts("Свинина, рис, лук", DIET_HALAL, None);

    assert_eq!(check.conflicts, vec!["свинина"]);
    assert_eq!(
        check.replacements,
        vec![Replacement {
            original: "свинин",
            replacement: "говядина/баранина",
        }]
    );
    assert_eq!(check.replacement_note(), "- свинин → говядина/баранина");
}

#[test]
fn test_conflicts_keep_input_order_and_duplicates() {
    let check = check_diet_conflicts("сыр, хлеб, молоко, сыр", DIET_LENTEN, None);
    assert_eq!(check.conflicts, vec!["сыр", "молоко", "сыр"]);
}

#[test]
fn test_unknown_diet_has_no_conflicts() {
    let check = check_diet_conflicts("свинина, пиво", "Кето", None);
    assert!(!check.has_conflicts());
    assert!(check.replacements.is_empty());
}

#[test]
fn test_allergy_diet_uses_only_user_allergens() {
    let check = check_diet_conflicts("арахисовая паста, свинина, мёд", DIET_ALLERGIES, Some("Арахис, мёд"));
    assert_eq!(check.conflicts, vec!["арахисовая паста", "мёд"]);
    assert!(check.replacements.is_empty());

    let check = check_diet_conflicts("арахис", DIET_ALLERGIES, None);
    assert!(!check.has_conflicts());
}

#[test]
fn test_low_calorie_replacements_only_for_present_items() {
    let check = check_diet_conflicts("курица, майонез", DIET_LOW_CALORIE, None);
    assert_eq!(check.conflicts, vec!["майонез"]);
    assert_eq!(check.replacements.len(), 1);
    assert_eq!(check.replacements[0].replacement, "греческий йогурт");
}

#[test]
fn test_split_items_trims_and_lowercases() {
    assert_eq!(split_items(" Рис , ,КУРИЦА,"), vec!["рис", "курица"]);
    assert!(split_items("").is_empty());
}
