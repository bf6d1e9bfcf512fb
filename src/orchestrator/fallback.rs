// ABOUTME: Deterministic supplement fallback used when the Stage 2 supplements call fails
// ABOUTME: Synthesizes per-day mobility/sleep/timing arrays plus goal-keyed add-ons (spec.md §4.8)

use std::collections::BTreeMap;

use crate::domain::checkpoint::SupplementsData;
use crate::domain::plan::{Intensity, WorkoutSplit};
use crate::domain::profile::ProfileSnapshot;
use crate::prompts::supplements::goal_keyed_lists;

/// Build a deterministic stand-in for the supplements call when it fails
/// outright (spec.md §4.8 "Fallback supplements"): per-day mobility/sleep/
/// timing notes keyed off the day's focus and intensity, plus two goal-keyed
/// recommended add-ons filtered against the user's current supplements.
#[must_use]
pub fn synthesize(split: &WorkoutSplit, profile: &ProfileSnapshot) -> SupplementsData {
    let (essential, optional) = goal_keyed_lists(profile.goal);
    let recommended_add_ons: Vec<String> = essential
        .iter()
        .chain(optional.iter())
        .map(|s| (*s).to_owned())
        .filter(|candidate| {
            !profile
                .current_supplements
                .iter()
                .any(|current| current.eq_ignore_ascii_case(candidate))
        })
        .take(2)
        .collect();

    let mut per_day_mobility = BTreeMap::new();
    let mut per_day_sleep_tips = BTreeMap::new();
    let mut per_day_timing_notes = BTreeMap::new();

    for (day, split_day) in &split.days {
        let mobility = if split_day.rest {
            vec![
                "10-15 minutes of light stretching and foam rolling".to_owned(),
                "Gentle walk to keep blood flowing".to_owned(),
            ]
        } else {
            split_day
                .focus
                .iter()
                .map(|focus| format!("Dynamic warm-up targeting {focus}"))
                .collect()
        };

        let sleep_tips = match split_day.intensity {
            Intensity::High => vec![
                "Prioritize 8+ hours tonight to support recovery from today's session".to_owned(),
            ],
            Intensity::Rest => vec!["Use the extra recovery time for a consistent sleep schedule".to_owned()],
            Intensity::Moderate | Intensity::Low => {
                vec!["Aim for 7-9 hours of consistent sleep".to_owned()]
            }
        };

        let timing_notes = vec!["Take supplements with a meal unless otherwise directed".to_owned()];

        per_day_mobility.insert(*day, mobility);
        per_day_sleep_tips.insert(*day, sleep_tips);
        per_day_timing_notes.insert(*day, timing_notes);
    }

    SupplementsData {
        recommended_add_ons,
        per_day_cards: BTreeMap::new(),
        per_day_mobility,
        per_day_sleep_tips,
        per_day_timing_notes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::SplitDay;
    use crate::domain::profile::Goal;
    use crate::domain::WEEKDAYS;
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
            current_supplements: vec!["whey protein".to_owned()],
            avoid_exercises: Vec::new(),
            avoid_foods: Vec::new(),
            injuries: Vec::new(),
            time_window_preferences: Vec::new(),
            special_requests: None,
            regeneration_request: None,
        }
    }

    fn split() -> WorkoutSplit {
        let mut days = BTreeMap::new();
        for w in WEEKDAYS {
            days.insert(w, SplitDay::rest_skeleton());
        }
        WorkoutSplit { days }
    }

    #[test]
    fn excludes_supplements_the_user_already_takes() {
        let data = synthesize(&split(), &profile());
        assert!(!data
            .recommended_add_ons
            .iter()
            .any(|s| s.eq_ignore_ascii_case("whey protein")));
    }

    #[test]
    fn recommends_at_most_two_add_ons() {
        let data = synthesize(&split(), &profile());
        assert!(data.recommended_add_ons.len() <= 2);
    }

    #[test]
    fn every_weekday_gets_mobility_and_sleep_entries() {
        let data = synthesize(&split(), &profile());
        for day in WEEKDAYS {
            assert!(!data.per_day_mobility[&day].is_empty());
            assert!(!data.per_day_sleep_tips[&day].is_empty());
        }
    }
}
