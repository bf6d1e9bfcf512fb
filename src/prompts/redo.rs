// ABOUTME: Redo-path prompts — revise an existing plan's workouts/nutrition for a stated reason
// ABOUTME: Each stage is one call over the whole week, matching the redo path's three-call budget (spec.md §4.8)

use std::collections::BTreeMap;

use crate::domain::plan::{DayNutrition, DayWorkout};
use crate::domain::Weekday;
use super::PromptPair;

/// Token budget for the workout-redo call (spec.md §4.8 redo path).
pub const WORKOUT_MAX_TOKENS: u32 = 4000;
/// Token budget for the nutrition-redo call.
pub const NUTRITION_MAX_TOKENS: u32 = 3500;
/// Token budget for the reasons-rewrite call.
pub const REASONS_MAX_TOKENS: u32 = 2000;

fn day_list(days: &BTreeMap<Weekday, String>) -> String {
    days.iter()
        .map(|(w, summary)| format!("{}: {summary}", w.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the single workout-redo call covering every day of the previous
/// plan (spec.md §4.8 redo path step (a), invoked when scope is `workout` or
/// `both`). The model is asked to return only the days it actually changed;
/// days it omits keep their previous workout unchanged by the caller.
#[must_use]
pub fn build_workout_redo(previous: &BTreeMap<Weekday, DayWorkout>, reason: &str) -> PromptPair {
    let system = format!(
        "You are revising a full week of workouts based on the user's feedback. Keep each \
         day's structure unless the feedback demands a change; most days typically stay the \
         same.\n\n\
         Respond with a JSON object keyed only by the lowercase weekday names whose workout \
         should change — omit any day that stays as-is. Each value is an object with \"focus\" \
         (array of strings) and \"blocks\" (array of objects with \"name\" and \"items\"). \
         {strict}",
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let summaries: BTreeMap<Weekday, String> = previous
        .iter()
        .map(|(w, d)| (*w, d.focus.join("/")))
        .collect();

    let user = format!(
        "Previous week's workout focus by day:\n{days}\n\nUser's reason for the redo: {reason}",
        days = day_list(&summaries),
    );

    PromptPair { system, user }
}

/// Build the single nutrition-redo call covering every day of the previous
/// plan (spec.md §4.8 redo path step (b), invoked when scope is `nutrition`
/// or `both`). Same "only changed days" contract as the workout call.
#[must_use]
pub fn build_nutrition_redo(previous: &BTreeMap<Weekday, DayNutrition>, reason: &str) -> PromptPair {
    let system = format!(
        "You are revising a full week of nutrition targets based on the user's feedback. Keep \
         macro targets close to the previous values for days the feedback doesn't concern.\n\n\
         Respond with a JSON object keyed only by the lowercase weekday names whose nutrition \
         should change — omit any day that stays as-is. Each value is an object with \
         \"totalKcal\", \"proteinG\", \"carbsG\", \"fatsG\", \"mealsPerDay\", \"meals\", \
         \"hydrationL\", and \"adjustments\". {strict}",
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let summaries: BTreeMap<Weekday, String> = previous
        .iter()
        .map(|(w, d)| (*w, format!("{:.0} kcal / {:.0} g protein", d.total_kcal, d.protein_g)))
        .collect();

    let user = format!(
        "Previous week's nutrition by day:\n{days}\n\nUser's reason for the redo: {reason}",
        days = day_list(&summaries),
    );

    PromptPair { system, user }
}

/// Build the short reasons-rewrite call used by the redo path (spec.md
/// §4.8 redo path step (c)), always issued once regardless of scope.
#[must_use]
pub fn build_reasons_redo(reason: &str) -> PromptPair {
    let system = format!(
        "You are rewriting the per-day motivating blurbs for a plan that was just revised \
         based on user feedback.\n\n\
         Respond with a JSON object keyed by the seven lowercase weekday names, each value a \
         single short string. {strict}",
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let user = format!("The user's reason for requesting the redo: {reason}");

    PromptPair { system, user }
}

/// Generic fallback string when the redo reasons call fails (spec.md §4.8
/// redo path: "a generic fallback string on failure").
pub const FALLBACK_REDO_REASON: &str = "Your plan has been updated based on your feedback.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{Meal, WorkoutBlock, WorkoutItem};
    use crate::domain::WEEKDAYS;

    fn workouts() -> BTreeMap<Weekday, DayWorkout> {
        WEEKDAYS
            .iter()
            .map(|&w| {
                (
                    w,
                    DayWorkout {
                        focus: vec!["Back".to_owned()],
                        blocks: vec![WorkoutBlock {
                            name: "Main".to_owned(),
                            items: vec![WorkoutItem {
                                exercise: "Deadlift".to_owned(),
                                sets: 5,
                                reps: "5".to_owned(),
                                reps_in_reserve: None,
                                notes: None,
                            }],
                        }],
                    },
                )
            })
            .collect()
    }

    fn nutrition() -> BTreeMap<Weekday, DayNutrition> {
        WEEKDAYS
            .iter()
            .map(|&w| {
                (
                    w,
                    DayNutrition {
                        total_kcal: 2200.0,
                        protein_g: 160.0,
                        carbs_g: None,
                        fats_g: None,
                        meals_per_day: 3,
                        meals: vec![Meal {
                            name: "Lunch".to_owned(),
                            items: Vec::new(),
                        }],
                        hydration_l: 2.5,
                        adjustments: Vec::new(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn workout_redo_prompt_carries_the_reason_and_every_day() {
        let prompt = build_workout_redo(&workouts(), "too much lower back strain");
        assert!(prompt.user.contains("too much lower back strain"));
        assert!(prompt.user.contains("monday"));
        assert!(prompt.user.contains("sunday"));
    }

    #[test]
    fn workout_redo_prompt_instructs_partial_response() {
        let prompt = build_workout_redo(&workouts(), "reason");
        assert!(prompt.system.contains("omit"));
    }

    #[test]
    fn nutrition_redo_prompt_carries_previous_macros() {
        let prompt = build_nutrition_redo(&nutrition(), "want more protein");
        assert!(prompt.user.contains("2200"));
        assert!(prompt.user.contains("want more protein"));
    }
}
