// ABOUTME: Plan artifacts — split, base nutrition, per-day workout/nutrition/recovery, final record
// ABOUTME: Mirrors spec.md §3's Workout Split / Base Nutrition / Day Workout / Day Nutrition / Day Recovery / Final Plan Record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// The seven weekday keys, in canonical order. Using an enum (rather than a
/// bare `String`) as the map key makes "exactly one entry per weekday"
/// structurally enforceable by `BTreeMap<Weekday, _>`'s construction from
/// [`super::WEEKDAYS`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

/// Daily training intensity, drives nutrition-adjustment deltas (spec.md §4.5).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    High,
    Moderate,
    Low,
    Rest,
}

impl std::fmt::Display for Intensity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Low => "low",
            Self::Rest => "rest",
        };
        f.write_str(s)
    }
}

/// One weekday's entry in the split. Field names are `camelCase` because
/// this struct is deserialized directly from the split stage's LLM response
/// (spec.md §4.5 Split); internal checkpoint round-trips use the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitDay {
    pub rest: bool,
    pub focus: Vec<String>,
    pub intensity: Intensity,
    #[serde(default)]
    pub primary_muscles: Vec<String>,
    #[serde(default)]
    pub secondary_muscles: Vec<String>,
}

impl SplitDay {
    /// A deterministic rest skeleton, used to fill any weekday the LLM
    /// omitted from its split response (spec.md §4.8 Stage 0).
    #[must_use]
    pub fn rest_skeleton() -> Self {
        Self {
            rest: true,
            focus: vec!["Rest".to_owned(), "Recovery".to_owned()],
            intensity: Intensity::Rest,
            primary_muscles: Vec::new(),
            secondary_muscles: Vec::new(),
        }
    }
}

/// The seven-day training split, produced first and used as context downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutSplit {
    pub days: BTreeMap<Weekday, SplitDay>,
}

impl WorkoutSplit {
    /// Count of non-rest days, compared against the profile's declared
    /// training-day count (logged on mismatch, never corrected — spec.md §9).
    #[must_use]
    pub fn non_rest_day_count(&self) -> usize {
        self.days.values().filter(|d| !d.rest).count()
    }
}

/// A base meal template: name, macro targets, and constituent food items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealTemplate {
    pub name: String,
    pub target_calories: f64,
    pub target_protein: f64,
    pub items: Vec<FoodItem>,
}

/// A single food + quantity pair within a meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItem {
    pub food: String,
    pub quantity: String,
}

/// Scalar daily nutrition targets plus base meal templates (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub meals_per_day: u8,
    pub hydration_l: f64,
    pub meal_templates: Vec<MealTemplate>,
}

/// One exercise prescription within a workout block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutItem {
    pub exercise: String,
    /// 1-10.
    pub sets: u8,
    pub reps: String,
    /// 0-5, reps in reserve.
    pub reps_in_reserve: Option<u8>,
    pub notes: Option<String>,
}

/// A named group of exercises (e.g. warm-up, main, cool-down).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutBlock {
    pub name: String,
    pub items: Vec<WorkoutItem>,
}

/// A single day's workout prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayWorkout {
    pub focus: Vec<String>,
    pub blocks: Vec<WorkoutBlock>,
}

impl DayWorkout {
    /// Deterministic mobility block for rest days (spec.md §4.5 Daily Workout).
    #[must_use]
    pub fn rest_day_mobility() -> Self {
        Self {
            focus: vec!["Rest".to_owned(), "Recovery".to_owned()],
            blocks: vec![WorkoutBlock {
                name: "Mobility".to_owned(),
                items: vec![WorkoutItem {
                    exercise: "Light stretching and foam rolling".to_owned(),
                    sets: 1,
                    reps: "10-15 min".to_owned(),
                    reps_in_reserve: None,
                    notes: Some("Keep movement gentle; focus on breathing".to_owned()),
                }],
            }],
        }
    }
}

/// A named meal with its constituent items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub items: Vec<FoodItem>,
}

/// A single day's nutrition prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNutrition {
    pub total_kcal: f64,
    pub protein_g: f64,
    pub carbs_g: Option<f64>,
    pub fats_g: Option<f64>,
    pub meals_per_day: u8,
    pub meals: Vec<Meal>,
    pub hydration_l: f64,
    #[serde(default)]
    pub adjustments: Vec<String>,
}

/// Current vs. recommended supplements for a single day.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SupplementCard {
    pub current: Vec<String>,
    pub add_ons: Vec<String>,
}

/// A single day's recovery prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecovery {
    pub mobility: Vec<String>,
    pub sleep_tips: Vec<String>,
    pub supplement_timing_notes: Vec<String>,
    pub supplement_card: SupplementCard,
}

/// One assembled day of the final plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDay {
    pub workout: DayWorkout,
    pub nutrition: DayNutrition,
    pub recovery: DayRecovery,
    pub reason: String,
}

/// The terminal artifact produced at phase-7 completion (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalPlanRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub days: BTreeMap<Weekday, PlanDay>,
    pub locked: bool,
    pub edit_counts: BTreeMap<Weekday, u32>,
}

impl FinalPlanRecord {
    /// `true` iff the plan has exactly the seven weekday keys (spec.md §8 property 5).
    #[must_use]
    pub fn has_all_weekdays(&self) -> bool {
        super::WEEKDAYS.iter().all(|w| self.days.contains_key(w))
    }
}
