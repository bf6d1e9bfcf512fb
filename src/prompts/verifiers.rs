// ABOUTME: Stage 3 verifier prompts — strict "errors only" framing, one per artifact kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::plan::{DayNutrition, DayWorkout};
use super::PromptPair;

const ERRORS_ONLY_FRAMING: &str = "Only report genuine errors — do not invent nitpicks or \
    stylistic preferences. If the day is sound, return an empty errors array.";

/// Shared verifier response shape instruction.
fn response_shape_instruction() -> String {
    format!(
        "Respond with a JSON object with \"isValid\" (boolean) and \"errors\" (array of short \
         strings, empty if valid). {strict}",
        strict = super::STRICT_JSON_INSTRUCTION,
    )
}

/// Build the workout verifier prompt for one day (spec.md §4.5 Verifiers).
#[must_use]
pub fn build_workout_verifier(day: &DayWorkout) -> PromptPair {
    let system = format!(
        "You are a strict reviewer checking one day's workout prescription for safety and \
         coherence issues (dangerous exercise combinations, missing warm-up/cool-down, \
         contradictory rep/set ranges). {ERRORS_ONLY_FRAMING}\n\n{shape}",
        shape = response_shape_instruction(),
    );

    let block_summary: Vec<String> = day
        .blocks
        .iter()
        .map(|b| format!("{}: {} exercises", b.name, b.items.len()))
        .collect();

    let user = format!(
        "Focus: {focus:?}\nBlocks: {blocks}",
        focus = day.focus,
        blocks = block_summary.join(", "),
    );

    PromptPair { system, user }
}

/// Build the nutrition verifier prompt for one day, pre-computed calories and
/// protein supplied by the Food Estimator (spec.md §4.5 Verifiers, §4.8 Stage
/// 3): the verifier fails the day only if the stated total differs from the
/// calculated total by more than 200 kcal or 20 g protein.
#[must_use]
pub fn build_nutrition_verifier(
    day: &DayNutrition,
    calculated_kcal: f64,
    calculated_protein: f64,
) -> PromptPair {
    let system = format!(
        "You are a strict reviewer checking one day's nutrition prescription. You are given \
         both the stated totals and totals calculated independently from the meal items. Fail \
         the day (is_valid=false) only if the stated total differs from the calculated total by \
         more than 200 kcal or more than 20 g protein; minor rounding differences are not \
         errors. {ERRORS_ONLY_FRAMING}\n\n{shape}\n\n\
         Include \"calculatedCalories\" and \"calculatedProtein\" in your response, echoing the \
         calculated values given to you.",
        shape = response_shape_instruction(),
    );

    let user = format!(
        "Stated total calories: {stated_kcal:.0}\nCalculated total calories: {calc_kcal:.0}\n\
         Stated protein: {stated_protein:.0} g\nCalculated protein: {calc_protein:.0} g",
        stated_kcal = day.total_kcal,
        calc_kcal = calculated_kcal,
        stated_protein = day.protein_g,
        calc_protein = calculated_protein,
    );

    PromptPair { system, user }
}

/// Build the supplements verifier prompt (spec.md §4.5 Verifiers).
#[must_use]
pub fn build_supplements_verifier(recommended_add_ons: &[String], current: &[String]) -> PromptPair {
    let system = format!(
        "You are a strict reviewer checking a supplement recommendation list for unsafe \
         combinations or items the user already takes being recommended again. \
         {ERRORS_ONLY_FRAMING}\n\n{shape}",
        shape = response_shape_instruction(),
    );

    let user = format!(
        "Recommended add-ons: {add_ons}\nUser already takes: {current_list}",
        add_ons = recommended_add_ons.join(", "),
        current_list = if current.is_empty() {
            "nothing".to_owned()
        } else {
            current.join(", ")
        },
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{Meal, WorkoutBlock};

    #[test]
    fn nutrition_verifier_carries_both_stated_and_calculated_values() {
        let day = DayNutrition {
            total_kcal: 2500.0,
            protein_g: 180.0,
            carbs_g: None,
            fats_g: None,
            meals_per_day: 3,
            meals: vec![Meal {
                name: "Dinner".to_owned(),
                items: Vec::new(),
            }],
            hydration_l: 2.5,
            adjustments: Vec::new(),
        };
        let prompt = build_nutrition_verifier(&day, 2300.0, 170.0);
        assert!(prompt.user.contains("2500"));
        assert!(prompt.user.contains("2300"));
        assert!(prompt.system.contains("200 kcal"));
    }

    #[test]
    fn workout_verifier_summarizes_blocks() {
        let day = DayWorkout {
            focus: vec!["Legs".to_owned()],
            blocks: vec![WorkoutBlock {
                name: "Main".to_owned(),
                items: Vec::new(),
            }],
        };
        let prompt = build_workout_verifier(&day);
        assert!(prompt.user.contains("Main"));
    }
}
