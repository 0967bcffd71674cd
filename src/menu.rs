//! Button captions and keyboard layouts.
//!
//! Captions double as the accepted answers of menu-driven steps, so they are
//! matched exactly and are not localized.

pub const CREATE_RECIPE: &str = "🍳 Создать рецепт";
pub const PUBLIC_OFFER: &str = "📜 Публичная оферта";
pub const OUR_CHANNEL: &str = "📢 Наш канал";
pub const HELP: &str = "🆘 Помощь";
pub const CANCEL: &str = "❌ Отмена";

pub const MEAL_TIMES: [&str; 4] = ["🌅 Завтрак", "🌇 Обед", "🌃 Ужин", "☕ Перекус"];

pub const CUISINES: [&str; 10] = [
    "🇷🇺 Русская",
    "🇮🇹 Итальянская",
    "🇯🇵 Японская",
    "🇬🇪 Кавказская",
    "🇺🇸 Американская",
    "🇫🇷 Французская",
    "🇹🇷 Турецкая",
    "🇨🇳 Китайская",
    "🇲🇽 Мексиканская",
    "🇮🇳 Индийская",
];

pub const DIET_NO_RESTRICTIONS: &str = "🚫 Нет ограничений";
pub const DIET_ALLERGIES: &str = "⚠️ Аллергии";
pub const DIET_LOW_CALORIE: &str = "⚖️ Низкокалорийные";
pub const DIET_HIGH_PROTEIN: &str = "💪 Высокобелковые";
pub const DIET_HALAL: &str = "☪️ Халяль";
pub const DIET_LENTEN: &str = "☦️ Постная";

pub const DIETS: [&str; 6] = [
    DIET_NO_RESTRICTIONS,
    DIET_ALLERGIES,
    DIET_LOW_CALORIE,
    DIET_HIGH_PROTEIN,
    DIET_HALAL,
    DIET_LENTEN,
];

pub const REGENERATE: &str = "♻️ Сгенерировать снова";
pub const SHARE: &str = "📤 Поделиться";
pub const OPEN_CHANNEL: &str = "📢 Перейти в канал";

/// Callback data of the inline "generate again" button
pub const CALLBACK_REGENERATE: &str = "regenerate";

/// Exact-match lookup of a caption among the allowed options
pub fn find_option(options: &[&'static str], text: &str) -> Option<&'static str> {
    options.iter().copied().find(|option| *option == text)
}

/// Arrange captions into rows of `per_row` buttons
pub fn rows(options: &[&'static str], per_row: usize) -> Vec<Vec<&'static str>> {
    options.chunks(per_row.max(1)).map(<[&str]>::to_vec).collect()
}

pub fn main_menu_layout() -> Vec<Vec<&'static str>> {
    vec![vec![CREATE_RECIPE], vec![PUBLIC_OFFER, OUR_CHANNEL], vec![HELP]]
}

/// Menu step layout with a trailing cancel row
pub fn step_layout(options: &[&'static str]) -> Vec<Vec<&'static str>> {
    let mut layout = rows(options, 2);
    layout.push(vec![CANCEL]);
    layout
}
