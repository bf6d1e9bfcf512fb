// ABOUTME: Stage 6 post-fix — deterministic clamps/defaults applied to every merged day
// ABOUTME: Grounded on spec.md §4.8 step 9; runs after merge, before the final plan record is built

use std::collections::BTreeMap;

use crate::domain::plan::PlanDay;
use crate::domain::profile::ProfileSnapshot;
use crate::domain::Weekday;

const KCAL_FLOOR: f64 = 1000.0;
const KCAL_CEILING: f64 = 6000.0;
const DEFAULT_HYDRATION_L: f64 = 2.5;

/// Apply the deterministic post-fix pass to every merged day in place
/// (spec.md §4.8 step 9): clamp `total_kcal` into
/// `[max(1000, target-100), min(6000, target+100)]`, default a missing
/// `protein_g`, force `meals_per_day` to the user's declared count, default
/// `hydration_l`, and ensure the recovery block and reason are non-empty.
pub fn apply(
    days: &mut BTreeMap<Weekday, PlanDay>,
    profile: &ProfileSnapshot,
    calorie_target: f64,
    protein_target: f64,
) {
    let kcal_low = (calorie_target - 100.0).max(KCAL_FLOOR);
    let kcal_high = (calorie_target + 100.0).min(KCAL_CEILING);

    for day in days.values_mut() {
        day.nutrition.total_kcal = day.nutrition.total_kcal.clamp(kcal_low, kcal_high);

        if day.nutrition.protein_g <= 0.0 {
            day.nutrition.protein_g = protein_target;
        }

        day.nutrition.meals_per_day = profile.meal_count;

        if day.nutrition.hydration_l <= 0.0 {
            day.nutrition.hydration_l = DEFAULT_HYDRATION_L;
        }

        if day.recovery.mobility.is_empty() {
            day.recovery.mobility = vec!["Light stretching and mobility work".to_owned()];
        }
        if day.recovery.sleep_tips.is_empty() {
            day.recovery.sleep_tips = vec!["Aim for 7-9 hours of consistent sleep".to_owned()];
        }
        if day.recovery.supplement_timing_notes.is_empty() {
            day.recovery.supplement_timing_notes =
                vec!["Take supplements with a meal unless otherwise directed".to_owned()];
        }

        if day.reason.trim().is_empty() {
            day.reason = "Stay consistent today and trust the process.".to_owned();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{DayNutrition, DayRecovery, DayWorkout, SupplementCard};
    use crate::domain::profile::Goal;
    use std::collections::HashSet;

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            goal: Goal::GeneralFitness,
            training_days_per_week: 4,
            equipment: HashSet::new(),
            dietary_preferences: HashSet::new(),
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
        }
    }

    fn day(total_kcal: f64, protein_g: f64) -> PlanDay {
        PlanDay {
            workout: DayWorkout {
                focus: vec!["Legs".to_owned()],
                blocks: Vec::new(),
            },
            nutrition: DayNutrition {
                total_kcal,
                protein_g,
                carbs_g: None,
                fats_g: None,
                meals_per_day: 1,
                meals: Vec::new(),
                hydration_l: 0.0,
                adjustments: Vec::new(),
            },
            recovery: DayRecovery {
                mobility: Vec::new(),
                sleep_tips: Vec::new(),
                supplement_timing_notes: Vec::new(),
                supplement_card: SupplementCard::default(),
            },
            reason: String::new(),
        }
    }

    #[test]
    fn calories_clamp_to_the_target_window() {
        let mut days = BTreeMap::new();
        days.insert(Weekday::Monday, day(5000.0, 150.0));
        apply(&mut days, &profile(), 2200.0, 150.0);
        assert_eq!(days[&Weekday::Monday].nutrition.total_kcal, 2300.0);
    }

    #[test]
    fn missing_protein_defaults_to_target() {
        let mut days = BTreeMap::new();
        days.insert(Weekday::Monday, day(2200.0, 0.0));
        apply(&mut days, &profile(), 2200.0, 160.0);
        assert_eq!(days[&Weekday::Monday].nutrition.protein_g, 160.0);
    }

    #[test]
    fn empty_recovery_and_reason_get_defaults() {
        let mut days = BTreeMap::new();
        days.insert(Weekday::Monday, day(2200.0, 150.0));
        apply(&mut days, &profile(), 2200.0, 150.0);
        let merged = &days[&Weekday::Monday];
        assert!(!merged.recovery.mobility.is_empty());
        assert!(!merged.reason.is_empty());
        assert_eq!(merged.nutrition.meals_per_day, 4);
        assert_eq!(merged.nutrition.hydration_l, 2.5);
    }
}
