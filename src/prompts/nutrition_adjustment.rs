// ABOUTME: Stage 2 fan-out prompt — per-day nutrition deltas derived from the day's intensity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::domain::plan::{BaseNutrition, Intensity};
use super::PromptPair;

/// Token budget for each nutrition-adjustment call (spec.md §4.8 Stage 2).
pub const MAX_TOKENS: u32 = 2000;

/// The deterministic deltas spec.md §4.5 Nutrition Adjustment defines per
/// intensity: `(carb_pct, protein_pct, hydration_delta_l)`. Fats are
/// unchanged at every intensity.
#[must_use]
pub const fn deltas_for(intensity: Intensity) -> (f64, f64, f64) {
    match intensity {
        Intensity::Rest => (-0.15, 0.0, -0.3),
        Intensity::High => (0.10, 0.05, 0.5),
        Intensity::Moderate => (0.0, 0.0, 0.0),
        Intensity::Low => (-0.08, 0.0, 0.0),
    }
}

/// Build the per-day nutrition-adjustment prompt (spec.md §4.5 Nutrition
/// Adjustment). Requests the per-day list of human-readable adjustments.
#[must_use]
pub fn build(base: &BaseNutrition, intensity: Intensity) -> PromptPair {
    let (carb_pct, protein_pct, hydration_delta) = deltas_for(intensity);

    let system = format!(
        "You are adjusting one day's nutrition relative to the baseline plan for a day at \
         {intensity:?} intensity. Apply: carbohydrates {carb_pct:+.0}%, protein \
         {protein_pct:+.0}%, hydration {hydration_delta:+.1} L relative to baseline. Fats are \
         unchanged.\n\n\
         Respond with a JSON object with \"totalKcal\", \"proteinG\", \"carbsG\", \"fatsG\", \
         \"mealsPerDay\", \"meals\" (array of {{\"name\", \"items\": [{{\"food\", \
         \"quantity\"}}]}}), \"hydrationL\", and \"adjustments\" (array of short human-readable \
         strings describing what changed from baseline and why). {strict}",
        intensity = intensity,
        carb_pct = carb_pct * 100.0,
        protein_pct = protein_pct * 100.0,
        hydration_delta = hydration_delta,
        strict = super::STRICT_JSON_INSTRUCTION,
    );

    let user = format!(
        "Baseline calories: {cal:.0}\nBaseline protein: {protein:.0} g\nBaseline carbs: \
         {carbs:.0} g\nBaseline fats: {fats:.0} g\nBaseline hydration: {hydration:.1} L\n\
         Meals per day: {meals}",
        cal = base.calories,
        protein = base.protein,
        carbs = base.carbs,
        fats = base.fats,
        hydration = base.hydration_l,
        meals = base.meals_per_day,
    );

    PromptPair { system, user }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BaseNutrition {
        BaseNutrition {
            calories: 2400.0,
            protein: 150.0,
            carbs: 260.0,
            fats: 70.0,
            meals_per_day: 4,
            hydration_l: 2.5,
            meal_templates: Vec::new(),
        }
    }

    #[test]
    fn rest_day_deltas_cut_carbs_and_water() {
        let (carbs, protein, water) = deltas_for(Intensity::Rest);
        assert!((carbs - -0.15).abs() < f64::EPSILON);
        assert_eq!(protein, 0.0);
        assert!((water - -0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn high_intensity_deltas_boost_carbs_protein_and_water() {
        let (carbs, protein, water) = deltas_for(Intensity::High);
        assert!((carbs - 0.10).abs() < f64::EPSILON);
        assert!((protein - 0.05).abs() < f64::EPSILON);
        assert!((water - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn low_intensity_only_trims_carbs() {
        let (carbs, protein, water) = deltas_for(Intensity::Low);
        assert!((carbs - -0.08).abs() < f64::EPSILON);
        assert_eq!(protein, 0.0);
        assert_eq!(water, 0.0);
    }

    #[test]
    fn prompt_carries_baseline_values() {
        let prompt = build(&base(), Intensity::High);
        assert!(prompt.user.contains("2400"));
        assert!(prompt.system.contains("+10%"));
    }
}
