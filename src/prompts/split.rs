// ABOUTME: Stage 0 prompt — the seven-day workout split, produced first and used as context downstream
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::profile::{Goal, ProfileSnapshot};
use super::PromptPair;

/// Goal-specific pairing heuristics rendered into the split prompt (spec.md §4.5 Split).
fn pairing_heuristics(goal: Goal) -> &'static str {
    match goal {
        Goal::MuscleGain => {
            "Favor a push/pull/legs or upper/lower split that maximizes weekly volume \
             per muscle group. Pair complementary muscle groups (e.g. chest+triceps, \
             back+biceps, legs alone) rather than full-body days."
        }
        Goal::WeightLoss => {
            "Favor full-body or circuit-style sessions with higher frequency and shorter \
             rest, biasing toward compound movements and conditioning work over isolated \
             muscle splits."
        }
        Goal::Endurance => {
            "Favor sessions built around aerobic base work, tempo efforts, and one or two \
             strength-maintenance days; avoid back-to-back high-intensity days."
        }
        Goal::GeneralFitness => {
            "Favor a balanced full-body or upper/lower rotation that touches every major \
             muscle group at least once per week without over-specializing."
        }
        Goal::FlexibilityMobility => {
            "Favor mobility-flow and light-resistance sessions; intensity should rarely \
             exceed moderate, and at least half the non-rest days should emphasize joint \
             range of motion over load."
        }
    }
}

/// Build the Stage 0 split prompt (spec.md §4.5 Split, ≤2000 token budget upstream).
#[must_use]
pub fn build(profile: &ProfileSnapshot) -> PromptPair {
    let system = format!(
        "You are a strength and conditioning coach designing a seven-day training split. \
         {heuristics}\n\n\
         Respond with a JSON object keyed exactly by the seven lowercase weekday names \
         (monday, tuesday, wednesday, thursday, friday, saturday, sunday). Each value is an \
         object with: \"rest\" (boolean), \"focus\" (array of short focus tags, e.g. \
         [\"Chest\",\"Triceps\"] or [\"Rest\",\"Recovery\"] for rest days), \"intensity\" \
         (one of \"high\", \"moderate\", \"low\", \"rest\"), and optionally \
         \"primaryMuscles\"/\"secondaryMuscles\" arrays. Exactly one entry per weekday. {strict}",
        heuristics = pairing_heuristics(profile.goal),
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let equipment = if profile.equipment.is_empty() {
        "bodyweight only".to_owned()
    } else {
        profile.equipment.iter().cloned().collect::<Vec<_>>().join(", ")
    };

    let user = format!(
        "Goal: {goal:?}\nTraining days per week: {days}\nAvailable equipment: {equipment}\n\
         Injuries to work around: {injuries}\nExercises to avoid: {avoid}\n\n\
         Produce exactly {days} non-rest days and {rest_days} rest day(s), distributed \
         sensibly across the week.",
        goal = profile.goal,
        days = profile.training_days_per_week,
        equipment = equipment,
        injuries = if profile.injuries.is_empty() {
            "none".to_owned()
        } else {
            profile.injuries.join(", ")
        },
        avoid = if profile.avoid_exercises.is_empty() {
            "none".to_owned()
        } else {
            profile.avoid_exercises.join(", ")
        },
        rest_days = 7 - profile.training_days_per_week.min(7),
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            goal: Goal::MuscleGain,
            training_days_per_week: 5,
            equipment: HashSet::from(["barbell".to_owned(), "dumbbells".to_owned()]),
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
    fn system_prompt_enumerates_all_seven_weekdays() {
        let prompt = build(&profile());
        for day in [
            "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
        ] {
            assert!(prompt.system.contains(day), "missing {day} in split prompt");
        }
    }

    #[test]
    fn user_prompt_carries_training_day_count() {
        let prompt = build(&profile());
        assert!(prompt.user.contains("Training days per week: 5"));
    }

    #[test]
    fn muscle_gain_uses_push_pull_legs_heuristic() {
        let prompt = build(&profile());
        assert!(prompt.system.contains("push/pull/legs"));
    }
}
