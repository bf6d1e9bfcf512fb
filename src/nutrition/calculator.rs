// ABOUTME: Deterministic BMR/TDEE/calorie/protein calculator
// ABOUTME: Grounded on the teacher's Mifflin-St Jeor implementation, re-specified constants
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Async-IO.org

//! Pure, deterministic nutrition math (spec.md §4.3). Unlike the teacher's
//! broader `intelligence::nutrition_calculator`, every constant here is the
//! one the prompt pipeline actually needs — a five-goal macro table and a
//! `MacronutrientConfig` would be dead weight for a worker that only ever
//! asks "what are today's calorie and protein targets."

use crate::domain::profile::{ActivityLevel, Goal, ProfileSnapshot, Sex};

/// Default BMR (kcal/day) used when biometric data is incomplete.
pub const DEFAULT_BMR_KCAL: f64 = 2000.0;

/// Mifflin-St Jeor coefficients.
const MSJ_WEIGHT_COEF: f64 = 10.0;
const MSJ_HEIGHT_COEF: f64 = 6.25;
const MSJ_AGE_COEF: f64 = -5.0;
const MSJ_MALE_CONSTANT: f64 = 5.0;
const MSJ_FEMALE_CONSTANT: f64 = -161.0;

/// Basal Metabolic Rate via the Mifflin-St Jeor equation when sex, height,
/// weight, and age are all present; otherwise the 2000 kcal default
/// (spec.md §4.3).
#[must_use]
pub fn calculate_bmr(profile: &ProfileSnapshot) -> f64 {
    let (Some(age), Some(sex), Some(height_cm), Some(weight_kg)) =
        (profile.age, profile.sex, profile.height_cm, profile.weight_kg)
    else {
        return DEFAULT_BMR_KCAL;
    };

    let gender_constant = match sex {
        Sex::Male => MSJ_MALE_CONSTANT,
        Sex::Female => MSJ_FEMALE_CONSTANT,
    };

    MSJ_WEIGHT_COEF * weight_kg + MSJ_HEIGHT_COEF * height_cm + MSJ_AGE_COEF * f64::from(age)
        + gender_constant
}

/// Activity-level multiplier applied to BMR (spec.md §4.3). Unknown activity
/// levels fall back to the "moderately active" factor.
#[must_use]
pub const fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Lightly => 1.375,
        ActivityLevel::Moderately | ActivityLevel::Unknown => 1.55,
        ActivityLevel::Very => 1.725,
        ActivityLevel::Extra => 1.9,
    }
}

/// Total Daily Energy Expenditure: `BMR * activity_factor`.
#[must_use]
pub fn calculate_tdee(bmr: f64, activity_level: Option<ActivityLevel>) -> f64 {
    bmr * activity_factor(activity_level.unwrap_or_default())
}

/// Goal-based multiplier applied to TDEE absent an explicit calorie target.
const fn goal_calorie_multiplier(goal: Goal) -> f64 {
    match goal {
        Goal::WeightLoss => 0.85,
        Goal::MuscleGain => 1.10,
        Goal::Endurance | Goal::GeneralFitness | Goal::FlexibilityMobility => 1.0,
    }
}

/// Daily calorie target: the user's explicit target if provided, else TDEE
/// adjusted by goal (spec.md §4.3).
#[must_use]
pub fn calculate_calorie_target(profile: &ProfileSnapshot, tdee: f64) -> f64 {
    profile
        .explicit_calorie_target
        .unwrap_or_else(|| tdee * goal_calorie_multiplier(profile.goal))
}

/// Daily protein target in grams: 2.2 g/kg for muscle-gain, else 1.8 g/kg;
/// falling back to 30% of the calorie target divided by 4 kcal/g when
/// weight is unknown (spec.md §4.3).
#[must_use]
pub fn calculate_protein_target(profile: &ProfileSnapshot, calorie_target: f64) -> f64 {
    let per_kg = if matches!(profile.goal, Goal::MuscleGain) {
        2.2
    } else {
        1.8
    };

    match profile.weight_kg {
        Some(weight_kg) => per_kg * weight_kg,
        None => (calorie_target * 0.30) / 4.0,
    }
}
