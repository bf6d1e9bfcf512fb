// ABOUTME: Stage 4 prompt — short per-day motivating blurb referencing training/nutrition/recovery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::plan::WorkoutSplit;
use super::PromptPair;

/// Token budget for the reasons call (spec.md §4.8 Stage 4).
pub const MAX_TOKENS: u32 = 2000;

/// Build the Stage 4 reasons prompt, given the split and the weekly
/// recommended supplement add-ons (spec.md §4.5 Reasons).
#[must_use]
pub fn build(split: &WorkoutSplit, recommended_add_ons: &[String]) -> PromptPair {
    let system = format!(
        "You are writing a short, motivating one-or-two-sentence blurb for each day of a \
         weekly fitness plan, referencing that day's training focus, nutrition approach, and \
         recovery support.\n\n\
         Respond with a JSON object keyed by the seven lowercase weekday names, each value a \
         single string. {strict}",
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let day_summaries: Vec<String> = split
        .days
        .iter()
        .map(|(w, d)| format!("{}: {} ({})", w.as_str(), d.focus.join("/"), d.intensity))
        .collect();

    let user = format!(
        "Days:\n{days}\n\nWeekly recommended supplement add-ons: {add_ons}",
        days = day_summaries.join("\n"),
        add_ons = if recommended_add_ons.is_empty() {
            "none".to_owned()
        } else {
            recommended_add_ons.join(", ")
        },
    );

    PromptPair { system, user }
}

/// Deterministic fallback blurb when the reasons call fails (spec.md §4.8
/// Stage 4): rest days get a recovery blurb, training days quote their focus
/// tags.
#[must_use]
pub fn fallback_reason(rest: bool, focus: &[String]) -> String {
    if rest {
        "A full rest day to let your body recover and come back stronger tomorrow.".to_owned()
    } else {
        format!(
            "Today's session targets {}, paired with nutrition and recovery support to match.",
            focus.join(" and ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::SplitDay;
    use crate::domain::WEEKDAYS;
    use std::collections::BTreeMap;

    #[test]
    fn fallback_for_rest_day_is_recovery_themed() {
        assert!(fallback_reason(true, &[]).contains("recover"));
    }

    #[test]
    fn fallback_for_training_day_quotes_focus() {
        let reason = fallback_reason(false, &["Chest".to_owned(), "Triceps".to_owned()]);
        assert!(reason.contains("Chest"));
        assert!(reason.contains("Triceps"));
    }

    #[test]
    fn prompt_lists_every_weekday() {
        let mut days = BTreeMap::new();
        for w in WEEKDAYS {
            days.insert(w, SplitDay::rest_skeleton());
        }
        let split = WorkoutSplit { days };
        let prompt = build(&split, &[]);
        assert!(prompt.user.contains("monday"));
        assert!(prompt.user.contains("sunday"));
    }
}
