// ABOUTME: Checkpoint payload — per-phase intermediate artifacts keyed by job id
// ABOUTME: Mirrors spec.md §3's Checkpoint shape; additive across phases

use super::plan::{BaseNutrition, DayNutrition, DayWorkout, SupplementCard, Weekday, WorkoutSplit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The orchestrator's resumable state. Phase N's payload is a superset of
/// phase M<N's fields (spec.md §8 property 2) — fields are never cleared,
/// only added to, as later stages complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    pub phase: i32,
    pub workout_split: Option<WorkoutSplit>,
    pub base_nutrition: Option<BaseNutrition>,
    pub daily_workouts: Option<BTreeMap<Weekday, DayWorkout>>,
    pub daily_nutrition: Option<BTreeMap<Weekday, DayNutrition>>,
    pub nutrition_deltas: Option<BTreeMap<Weekday, Vec<String>>>,
    pub supplements_data: Option<SupplementsData>,
    pub daily_reasons: Option<BTreeMap<Weekday, String>>,
}

/// Weekly supplement recommendation plus per-day supplement cards produced
/// by the Stage 2 supplements call (spec.md §4.8 step 4 and §4.5 Supplements).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplementsData {
    pub recommended_add_ons: Vec<String>,
    pub per_day_cards: BTreeMap<Weekday, SupplementCard>,
    pub per_day_mobility: BTreeMap<Weekday, Vec<String>>,
    pub per_day_sleep_tips: BTreeMap<Weekday, Vec<String>>,
    pub per_day_timing_notes: BTreeMap<Weekday, Vec<String>>,
}

impl Checkpoint {
    /// `true` when the checkpoint has progressed at least to `phase`, used
    /// by every "if phase >= N, skip" guard in the orchestrator.
    #[must_use]
    pub const fn reached(&self, phase: i32) -> bool {
        self.phase >= phase
    }
}
