// ABOUTME: Profile snapshot — the immutable record taken at job creation (spec.md §3)
// ABOUTME: Required and optional user attributes feeding every prompt stage

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Training goal, drives split pairing heuristics and macro targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Goal {
    WeightLoss,
    MuscleGain,
    Endurance,
    GeneralFitness,
    FlexibilityMobility,
}

/// Biological sex, required alongside age/height/weight for BMR.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

/// Self-reported activity level feeding the TDEE multiplier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Lightly,
    Moderately,
    Very,
    Extra,
    /// Unrecognized or absent — falls back to the "moderately" factor (spec.md §4.3).
    #[default]
    Unknown,
}

/// Dietary preference. At most one may be present in a profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DietaryPreference {
    Vegetarian,
    Eggitarian,
    NonVeg,
}

/// Immutable snapshot of the user's profile taken at job creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub goal: Goal,
    /// Training days per week, 1-7.
    pub training_days_per_week: u8,
    pub equipment: HashSet<String>,
    /// At most one of {vegetarian, eggitarian, non_veg}.
    pub dietary_preferences: HashSet<DietaryPreference>,
    /// Meals per day, 1-8, defaults to 3.
    #[serde(default = "default_meal_count")]
    pub meal_count: u8,

    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub explicit_calorie_target: Option<f64>,
    pub current_supplements: Vec<String>,
    pub avoid_exercises: Vec<String>,
    pub avoid_foods: Vec<String>,
    pub injuries: Vec<String>,
    pub time_window_preferences: Vec<String>,
    pub special_requests: Option<String>,
    pub regeneration_request: Option<String>,
}

const fn default_meal_count() -> u8 {
    3
}

impl ProfileSnapshot {
    /// `true` when all four biometric inputs needed for Mifflin-St Jeor are present.
    #[must_use]
    pub const fn has_full_biometrics(&self) -> bool {
        self.age.is_some() && self.sex.is_some() && self.height_cm.is_some() && self.weight_kg.is_some()
    }

    /// The banned-food set implied by the dietary preference, per spec.md §4.5.
    #[must_use]
    pub fn banned_foods(&self) -> Vec<&'static str> {
        if self
            .dietary_preferences
            .contains(&DietaryPreference::Vegetarian)
        {
            vec![
                "meat", "chicken", "fish", "seafood", "eggs", "beef", "pork", "salmon", "tuna",
                "shrimp",
            ]
        } else if self
            .dietary_preferences
            .contains(&DietaryPreference::Eggitarian)
        {
            vec![
                "meat", "chicken", "fish", "seafood", "beef", "pork", "salmon", "tuna", "shrimp",
            ]
        } else {
            Vec::new()
        }
    }
}
