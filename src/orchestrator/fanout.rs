// ABOUTME: Stage 2 parallel fan-out — one task per weekday's workout and nutrition, one supplements task
// ABOUTME: Grounded on tokio::task::JoinSet-style concurrent fan-out; individual failures degrade a slot, never abort

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use super::convert;
use crate::domain::plan::{BaseNutrition, DayNutrition, DayWorkout, WorkoutSplit};
use crate::domain::profile::ProfileSnapshot;
use crate::domain::Weekday;
use crate::llm::LlmClient;
use crate::prompts;

/// Everything Stage 2 produces. Slots missing from `daily_workouts` or
/// `daily_nutrition` mean that day's call failed; the merge stage fills them
/// with deterministic defaults (spec.md §4.8 Stage 5 "Merge").
pub struct FanoutResult {
    pub daily_workouts: BTreeMap<Weekday, DayWorkout>,
    pub daily_nutrition: BTreeMap<Weekday, DayNutrition>,
    pub nutrition_deltas: BTreeMap<Weekday, Vec<String>>,
    pub supplements: crate::domain::checkpoint::SupplementsData,
}

/// Run the Stage 2 fan-out: 7 workout calls, 7 nutrition calls, and 1
/// supplements call, all launched concurrently. Rest days short-circuit the
/// workout call entirely with [`DayWorkout::rest_day_mobility`] rather than
/// spending a token budget on a deterministic shape (spec.md §4.8 Stage 2
/// Design Notes).
pub async fn run(
    llm: &Arc<dyn LlmClient>,
    split: &WorkoutSplit,
    base: &BaseNutrition,
    profile: &ProfileSnapshot,
) -> FanoutResult {
    // Spawn the supplements call first so it runs concurrently with the two
    // per-day fan-outs below rather than only after they drain.
    let supplements_handle = {
        let llm = llm.clone();
        let split = split.clone();
        let profile = profile.clone();
        tokio::spawn(async move {
            let prompt = prompts::supplements::build(&split, &profile);
            llm.generate(&prompt.system, &prompt.user, prompts::supplements::MAX_TOKENS)
                .await
                .and_then(|text| convert::parse_supplements(&text))
        })
    };

    let mut workout_tasks = JoinSet::new();
    for (day, split_day) in split.days.clone() {
        let llm = llm.clone();
        let profile = profile.clone();
        workout_tasks.spawn(async move {
            let result = if split_day.rest {
                Ok(DayWorkout::rest_day_mobility())
            } else {
                let prompt = prompts::daily_workout::build(&split_day, &profile);
                let max_tokens = prompts::daily_workout::max_tokens_for(&split_day);
                match llm.generate(&prompt.system, &prompt.user, max_tokens).await {
                    Ok(text) => convert::parse_day_workout(&text),
                    Err(e) => Err(e),
                }
            };
            (day, result)
        });
    }

    let mut nutrition_tasks = JoinSet::new();
    for (day, split_day) in split.days.clone() {
        let llm = llm.clone();
        let base = base.clone();
        nutrition_tasks.spawn(async move {
            let prompt = prompts::nutrition_adjustment::build(&base, split_day.intensity);
            let result = match llm
                .generate(&prompt.system, &prompt.user, prompts::nutrition_adjustment::MAX_TOKENS)
                .await
            {
                Ok(text) => convert::parse_day_nutrition(&text),
                Err(e) => Err(e),
            };
            (day, result)
        });
    }

    let mut daily_workouts = BTreeMap::new();
    while let Some(outcome) = workout_tasks.join_next().await {
        match outcome {
            Ok((day, Ok(workout))) => {
                daily_workouts.insert(day, workout);
            }
            Ok((day, Err(e))) => {
                warn!(day = day.as_str(), "daily workout call failed, slot left empty: {e}");
            }
            Err(join_err) => warn!("workout fan-out task panicked: {join_err}"),
        }
    }

    let mut daily_nutrition = BTreeMap::new();
    let mut nutrition_deltas = BTreeMap::new();
    while let Some(outcome) = nutrition_tasks.join_next().await {
        match outcome {
            Ok((day, Ok(nutrition))) => {
                nutrition_deltas.insert(day, nutrition.adjustments.clone());
                daily_nutrition.insert(day, nutrition);
            }
            Ok((day, Err(e))) => {
                warn!(day = day.as_str(), "daily nutrition call failed, slot left empty: {e}");
            }
            Err(join_err) => warn!("nutrition fan-out task panicked: {join_err}"),
        }
    }

    let supplements = match supplements_handle.await {
        Ok(Ok(data)) => data,
        Ok(Err(e)) => {
            warn!("supplements call failed, using deterministic fallback: {e}");
            super::fallback::synthesize(split, profile)
        }
        Err(join_err) => {
            warn!("supplements task panicked: {join_err}");
            super::fallback::synthesize(split, profile)
        }
    };

    FanoutResult {
        daily_workouts,
        daily_nutrition,
        nutrition_deltas,
        supplements,
    }
}
