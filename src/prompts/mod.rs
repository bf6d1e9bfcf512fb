// ABOUTME: Prompt builder module root — one submodule per pipeline stage
// ABOUTME: Grounded on the teacher's llm/prompts module split and doc-comment density
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Unlike the teacher's `llm::prompts` (compile-time Markdown files for a
//! single fixed assistant persona), every prompt here is rendered per job
//! from the profile snapshot and accumulated checkpoint state — so each
//! stage gets a `build_*` function returning a [`PromptPair`] rather than a
//! `const`. The contract is the same: a system/user pair, with the expected
//! JSON shape spelled out verbatim so the parser has a repair target
//! (spec.md §4.5).

pub mod base_nutrition;
pub mod daily_workout;
pub mod meal_names;
pub mod nutrition_adjustment;
pub mod reasons;
pub mod redo;
pub mod split;
pub mod supplements;
pub mod verifiers;

/// A rendered `{system, user}` pair ready to hand to [`crate::llm::LlmClient::generate`].
#[derive(Debug, Clone)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Shared closing instruction appended to every stage's system prompt:
/// forbids Markdown wrappers and trailing commentary so the Recovery
/// Parser's happy path (direct parse) is hit as often as possible.
pub(crate) const STRICT_JSON_INSTRUCTION: &str = "Respond with raw JSON only. Do not wrap the response in Markdown code fences. Do not include any explanation, preamble, or trailing commentary before or after the JSON object.";

/// Renders the three dietary-ban lists mentioned in spec.md §4.5 Base
/// Nutrition ("three banned-food lists"): vegetarian, eggitarian, and the
/// user's own `avoid_foods`.
pub(crate) fn render_banned_foods(profile: &crate::domain::profile::ProfileSnapshot) -> String {
    use crate::domain::profile::DietaryPreference;

    let vegetarian_bans = ["meat", "chicken", "fish", "seafood", "eggs", "beef", "pork", "salmon", "tuna", "shrimp"];
    let eggitarian_bans = ["meat", "chicken", "fish", "seafood", "beef", "pork", "salmon", "tuna", "shrimp"];

    let mut lines = Vec::new();
    if profile.dietary_preferences.contains(&DietaryPreference::Vegetarian) {
        lines.push(format!("Vegetarian — never include: {}", vegetarian_bans.join(", ")));
    }
    if profile.dietary_preferences.contains(&DietaryPreference::Eggitarian) {
        lines.push(format!("Eggitarian — never include: {}", eggitarian_bans.join(", ")));
    }
    if !profile.avoid_foods.is_empty() {
        lines.push(format!("User-specified avoidances — never include: {}", profile.avoid_foods.join(", ")));
    }
    if lines.is_empty() {
        "No dietary restrictions.".to_owned()
    } else {
        lines.join("\n")
    }
}
