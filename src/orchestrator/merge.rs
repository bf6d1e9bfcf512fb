// ABOUTME: Stage 5 merge — assemble per-weekday {workout, nutrition, recovery, reason}
// ABOUTME: Fills sensible defaults for slots left empty by a failed fan-out task (spec.md §4.8 step 8)

use std::collections::BTreeMap;

use crate::domain::checkpoint::SupplementsData;
use crate::domain::plan::{
    BaseNutrition, DayNutrition, DayRecovery, DayWorkout, FoodItem, Meal, PlanDay, SupplementCard,
};
use crate::domain::Weekday;

fn default_day_nutrition(base: &BaseNutrition) -> DayNutrition {
    DayNutrition {
        total_kcal: base.calories,
        protein_g: base.protein,
        carbs_g: Some(base.carbs),
        fats_g: Some(base.fats),
        meals_per_day: base.meals_per_day,
        meals: base
            .meal_templates
            .iter()
            .map(|t| Meal {
                name: t.name.clone(),
                items: t
                    .items
                    .iter()
                    .map(|i| FoodItem {
                        food: i.food.clone(),
                        quantity: i.quantity.clone(),
                    })
                    .collect(),
            })
            .collect(),
        hydration_l: base.hydration_l,
        adjustments: Vec::new(),
    }
}

fn dedup_add_ons(current: &[String], global: &[String]) -> Vec<String> {
    let mut merged = current.to_vec();
    for add_on in global {
        if !merged.iter().any(|c| c.eq_ignore_ascii_case(add_on)) {
            merged.push(add_on.clone());
        }
    }
    merged
}

/// Assemble the seven [`PlanDay`]s from the accumulated Stage 2-4
/// dictionaries. A weekday missing from `daily_workouts` falls back to
/// [`DayWorkout::rest_day_mobility`]; one missing from `daily_nutrition`
/// falls back to the base-nutrition template; a missing reason gets the
/// deterministic fallback blurb (spec.md §4.8 step 8).
#[must_use]
pub fn merge(
    daily_workouts: &BTreeMap<Weekday, DayWorkout>,
    daily_nutrition: &BTreeMap<Weekday, DayNutrition>,
    daily_reasons: &BTreeMap<Weekday, String>,
    supplements: &SupplementsData,
    base_nutrition: &BaseNutrition,
) -> BTreeMap<Weekday, PlanDay> {
    let mut days = BTreeMap::new();

    for day in crate::domain::WEEKDAYS {
        let workout = daily_workouts
            .get(&day)
            .cloned()
            .unwrap_or_else(DayWorkout::rest_day_mobility);

        let nutrition = daily_nutrition
            .get(&day)
            .cloned()
            .unwrap_or_else(|| default_day_nutrition(base_nutrition));

        let current_card = supplements.per_day_cards.get(&day).cloned().unwrap_or_default();
        let supplement_card = SupplementCard {
            current: current_card.current,
            add_ons: dedup_add_ons(&current_card.add_ons, &supplements.recommended_add_ons),
        };

        let recovery = DayRecovery {
            mobility: supplements.per_day_mobility.get(&day).cloned().unwrap_or_default(),
            sleep_tips: supplements.per_day_sleep_tips.get(&day).cloned().unwrap_or_default(),
            supplement_timing_notes: supplements
                .per_day_timing_notes
                .get(&day)
                .cloned()
                .unwrap_or_default(),
            supplement_card,
        };

        let is_rest_day = workout.focus.iter().any(|f| f == "Rest");
        let reason = daily_reasons
            .get(&day)
            .cloned()
            .unwrap_or_else(|| crate::prompts::reasons::fallback_reason(is_rest_day, &workout.focus));

        days.insert(
            day,
            PlanDay {
                workout,
                nutrition,
                recovery,
                reason,
            },
        );
    }

    days
}
