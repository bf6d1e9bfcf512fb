// ABOUTME: Stage 2 fan-out prompt — the single weekly supplements call
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::plan::WorkoutSplit;
use crate::domain::profile::{Goal, ProfileSnapshot};
use super::PromptPair;

/// Token budget for the supplements call (spec.md §4.8 Stage 2).
pub const MAX_TOKENS: u32 = 5000;

/// Goal-keyed essential/optional supplement lists (spec.md §4.5 Supplements).
#[must_use]
pub const fn goal_keyed_lists(goal: Goal) -> (&'static [&'static str], &'static [&'static str]) {
    match goal {
        Goal::MuscleGain => (
            &["whey protein", "creatine monohydrate"],
            &["beta-alanine", "citrulline malate", "ZMA"],
        ),
        Goal::WeightLoss => (
            &["whey protein", "multivitamin"],
            &["green tea extract", "fiber supplement", "electrolytes"],
        ),
        Goal::Endurance => (
            &["electrolytes", "multivitamin"],
            &["beetroot/nitrate", "caffeine", "BCAAs"],
        ),
        Goal::GeneralFitness => (
            &["multivitamin", "omega-3"],
            &["whey protein", "vitamin D"],
        ),
        Goal::FlexibilityMobility => (
            &["magnesium", "omega-3"],
            &["collagen peptides", "turmeric/curcumin"],
        ),
    }
}

/// Age-bracket guidance appended to the supplements system prompt.
#[must_use]
pub fn age_bracket_guidance(age: Option<u32>) -> &'static str {
    match age {
        Some(a) if a < 18 => {
            "User is under 18: recommend food-first sources and avoid stimulant-based \
             supplements entirely."
        }
        Some(a) if a >= 50 => {
            "User is 50+: prioritize joint-support and bone-density considerations \
             (vitamin D, calcium, collagen) alongside the goal-keyed list."
        }
        _ => "Standard adult guidance applies.",
    }
}

/// Build the weekly supplements prompt (spec.md §4.5 Supplements).
#[must_use]
pub fn build(split: &WorkoutSplit, profile: &ProfileSnapshot) -> PromptPair {
    let (essential, optional) = goal_keyed_lists(profile.goal);

    let system = format!(
        "You are a sports-nutrition supplement advisor. Goal: {goal:?}. Essential \
         supplements for this goal: {essential}. Optional supplements: {optional}. \
         {age_guidance}\n\n\
         The user already takes: {current}. Recommend 2-4 items the user does not already \
         take.\n\n\
         Respond with a JSON object with \"recommendedAddOns\" (array of item names) and, for \
         each of the seven lowercase weekday keys, an object with \"mobility\" (array of \
         strings), \"sleepTips\" (array of strings), and \"supplementTimingNotes\" (array of \
         strings). {strict}",
        goal = profile.goal,
        essential = essential.join(", "),
        optional = optional.join(", "),
        age_guidance = age_bracket_guidance(profile.age),
        current = if profile.current_supplements.is_empty() {
            "nothing".to_owned()
        } else {
            profile.current_supplements.join(", ")
        },
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let non_rest_days: Vec<&str> = split
        .days
        .iter()
        .filter(|(_, d)| !d.rest)
        .map(|(w, _)| w.as_str())
        .collect();

    let user = format!("Training days this week: {}", non_rest_days.join(", "));

    PromptPair { system, user }
}
