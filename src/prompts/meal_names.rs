// ABOUTME: Meal-naming guide keyed by meal count, used in the Base Nutrition prompt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Meal names for a given daily meal count (1-8), per spec.md §6's
/// meal-naming table: 1 OMAD; 2 First/Second Meal; 3 Breakfast/Lunch/Dinner;
/// 4 adds an Afternoon Snack; 5-8 extend with a morning snack, evening
/// snack, pre/post-workout, and a before-bed meal. Counts outside the table
/// clamp to the nearest defined entry.
#[must_use]
pub fn names_for_count(meal_count: u8) -> &'static [&'static str] {
    match meal_count.clamp(1, 8) {
        1 => &["OMAD"],
        2 => &["First Meal", "Second Meal"],
        3 => &["Breakfast", "Lunch", "Dinner"],
        4 => &["Breakfast", "Lunch", "Afternoon Snack", "Dinner"],
        5 => &["Breakfast", "Morning Snack", "Lunch", "Afternoon Snack", "Dinner"],
        6 => &[
            "Breakfast",
            "Morning Snack",
            "Lunch",
            "Afternoon Snack",
            "Evening Snack",
            "Dinner",
        ],
        7 => &[
            "Breakfast",
            "Morning Snack",
            "Lunch",
            "Afternoon Snack",
            "Pre-Workout",
            "Post-Workout",
            "Dinner",
        ],
        _ => &[
            "Breakfast",
            "Morning Snack",
            "Lunch",
            "Afternoon Snack",
            "Pre-Workout",
            "Post-Workout",
            "Dinner",
            "Before Bed",
        ],
    }
}

/// Renders the meal-naming guide as a bullet list for embedding in a prompt.
#[must_use]
pub fn render_guide(meal_count: u8) -> String {
    names_for_count(meal_count)
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}. {name}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_meals_maps_to_classic_names() {
        assert_eq!(names_for_count(3), ["Breakfast", "Lunch", "Dinner"]);
    }

    #[test]
    fn one_meal_is_omad() {
        assert_eq!(names_for_count(1), ["OMAD"]);
    }

    #[test]
    fn two_meals_are_first_and_second() {
        assert_eq!(names_for_count(2), ["First Meal", "Second Meal"]);
    }

    #[test]
    fn out_of_range_counts_clamp_to_table_bounds() {
        assert_eq!(names_for_count(0), names_for_count(1));
        assert_eq!(names_for_count(20), names_for_count(8));
    }

    #[test]
    fn render_guide_numbers_each_meal() {
        let guide = render_guide(2);
        assert_eq!(guide, "1. First Meal\n2. Second Meal");
    }
}
