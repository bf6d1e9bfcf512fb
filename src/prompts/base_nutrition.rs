// ABOUTME: Stage 1 prompt — scalar daily nutrition targets plus base meal templates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::profile::ProfileSnapshot;
use super::{meal_names, render_banned_foods, PromptPair};

/// Build the Stage 1 base-nutrition prompt (spec.md §4.5 Base Nutrition,
/// ≤3000 token budget upstream). `calorie_target`/`protein_target` come from
/// [`crate::nutrition::calculator`].
#[must_use]
pub fn build(profile: &ProfileSnapshot, calorie_target: f64, protein_target: f64) -> PromptPair {
    let system = format!(
        "You are a sports nutritionist building the baseline daily nutrition targets for a \
         {meal_count}-meal-per-day plan.\n\n\
         Dietary rules:\n{banned}\n\n\
         Meal-naming guide for {meal_count} meals per day:\n{guide}\n\n\
         Respond with a JSON object with fields: \"calories\" (number), \"protein\" (number, \
         grams), \"carbs\" (number, grams), \"fats\" (number, grams), \"mealsPerDay\" \
         (integer), \"hydrationL\" (number, liters), and \"mealTemplates\" (array of objects \
         each with \"name\", \"targetCalories\", \"targetProtein\", and \"items\" — an array \
         of {{\"food\", \"quantity\"}} pairs). {strict}",
        meal_count = profile.meal_count,
        banned = render_banned_foods(profile),
        guide = meal_names::render_guide(profile.meal_count),
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let user = format!(
        "Daily calorie target: {calorie_target:.0} kcal\nDaily protein target: {protein_target:.0} g\n\
         Meals per day: {meal_count}\nSpecial requests: {special}",
        meal_count = profile.meal_count,
        special = profile.special_requests.as_deref().unwrap_or("none"),
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{DietaryPreference, Goal};
    use std::collections::HashSet;

    #[test]
    fn vegetarian_profile_includes_banned_list_and_meal_guide() {
        let profile = ProfileSnapshot {
            goal: Goal::GeneralFitness,
            training_days_per_week: 3,
            equipment: HashSet::new(),
            dietary_preferences: HashSet::from([DietaryPreference::Vegetarian]),
            meal_count: 4,
            age: None,
            sex: None,
            height_cm: None,
            weight_kg: None,
            activity_level: None,
            explicit_calorie_target: None,
            current_supplements: Vec::new(),
            avoid_exercises: Vec::new(),
            avoid_foods: Vec::new(),
            injuries: Vec::new(),
            time_window_preferences: Vec::new(),
            special_requests: None,
            regeneration_request: None,
        };
        let prompt = build(&profile, 2200.0, 120.0);
        assert!(prompt.system.contains("Vegetarian"));
        assert!(prompt.system.contains("Afternoon Snack"));
        assert!(prompt.user.contains("2200"));
    }
}
