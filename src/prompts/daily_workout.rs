// ABOUTME: Stage 2 fan-out prompt — one per weekday, expects focus/intensity from the split
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::plan::{Intensity, SplitDay};
use crate::domain::profile::ProfileSnapshot;
use super::PromptPair;

/// Token budget for a single day's workout call: rest days are capped tight
/// since the response is a deterministic mobility shape (spec.md §4.8 Stage 2).
pub const REST_DAY_MAX_TOKENS: u32 = 500;
/// Token budget for a non-rest day's workout call.
pub const TRAINING_DAY_MAX_TOKENS: u32 = 2500;

/// Build the per-day workout prompt for one weekday's split entry (spec.md
/// §4.5 Daily Workout). Callers should short-circuit rest days with
/// [`crate::domain::plan::DayWorkout::rest_day_mobility`] rather than issuing
/// this call at all, per the Design Notes — but the prompt still renders a
/// reasonable rest-day shape so a resumed call degrades gracefully.
#[must_use]
pub fn build(split_day: &SplitDay, profile: &ProfileSnapshot) -> PromptPair {
    let equipment = if profile.equipment.is_empty() {
        "bodyweight only".to_owned()
    } else {
        profile.equipment.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    let system = format!(
        "You are a strength coach writing one day's workout. The day's focus is \
         {focus:?} at {intensity:?} intensity. Available equipment: {equipment}. \
         Exercises to avoid: {avoid}. Injuries to work around: {injuries}.\n\n\
         Respond with a JSON object with \"focus\" (array of strings) and \"blocks\" \
         (array of objects, each with \"name\" and \"items\" — an array of exercises with \
         \"exercise\", \"sets\" (1-10), \"reps\" (string prescription like \"8-12\"), \
         optional \"repsInReserve\" (0-5), optional \"notes\"). Every non-rest day must have \
         at least three blocks: a warm-up, a main block, and a cool-down. {strict}",
        focus = split_day.focus,
        intensity = split_day.intensity,
        equipment = equipment,
        avoid = if profile.avoid_exercises.is_empty() {
            "none".to_owned()
        } else {
            profile.avoid_exercises.join(", ")
        },
        injuries = if profile.injuries.is_empty() {
            "none".to_owned()
        } else {
            profile.injuries.join(", ")
        },
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let user = format!(
        "Goal: {goal:?}\nIs this a rest day: {rest}",
        goal = profile.goal,
        rest = split_day.rest,
    );

    PromptPair { system, user }
}

/// Token budget appropriate for `split_day`'s intensity (spec.md §4.8 Stage 2).
#[must_use]
pub const fn max_tokens_for(split_day: &SplitDay) -> u32 {
    match split_day.intensity {
        Intensity::Rest => REST_DAY_MAX_TOKENS,
        Intensity::High | Intensity::Moderate | Intensity::Low => TRAINING_DAY_MAX_TOKENS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Goal;
    use std::collections::HashSet;

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            goal: Goal::MuscleGain,
            training_days_per_week: 5,
            equipment: HashSet::new(),
            dietary_preferences: HashSet::new(),
            meal_count: 3,
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
        }
    }

    #[test]
    fn rest_day_gets_the_tight_token_budget() {
        let day = SplitDay::rest_skeleton();
        assert_eq!(max_tokens_for(&day), REST_DAY_MAX_TOKENS);
    }

    #[test]
    fn training_day_gets_the_wider_token_budget() {
        let day = SplitDay {
            rest: false,
            focus: vec!["Chest".to_owned(), "Triceps".to_owned()],
            intensity: Intensity::High,
            primary_muscles: Vec::new(),
            secondary_muscles: Vec::new(),
        };
        assert_eq!(max_tokens_for(&day), TRAINING_DAY_MAX_TOKENS);
    }

    #[test]
    fn prompt_mentions_three_block_requirement() {
        let day = SplitDay {
            rest: false,
            focus: vec!["Back".to_owned()],
            intensity: Intensity::Moderate,
            primary_muscles: Vec::new(),
            secondary_muscles: Vec::new(),
        };
        let prompt = build(&day, &profile());
        assert!(prompt.system.contains("warm-up"));
    }
}
