// ABOUTME: Redo path — at most three LLM calls revise an existing plan instead of generating fresh
// ABOUTME: Grounded on spec.md §4.8 "Redo path"; merges changed days into a clone of the source plan

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::domain::plan::{DayNutrition, DayWorkout, FinalPlanRecord, PlanDay};
use crate::domain::{RedoContext, RedoScope, Weekday, WEEKDAYS};
use crate::errors::{AppError, ErrorCode};
use crate::llm::LlmClient;
use crate::prompts;

fn parse_partial_workouts(text: &str) -> Result<BTreeMap<Weekday, DayWorkout>, AppError> {
    let value = crate::parser::parse(text)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::json_parse("workout redo response is not a JSON object"))?;

    let mut changed = BTreeMap::new();
    for day in WEEKDAYS {
        if let Some(raw) = obj.get(day.as_str()) {
            match serde_json::from_value::<DayWorkout>(raw.clone()) {
                Ok(workout) => {
                    changed.insert(day, workout);
                }
                Err(e) => warn!(day = day.as_str(), "workout redo day malformed, keeping previous: {e}"),
            }
        }
    }
    Ok(changed)
}

fn parse_partial_nutrition(text: &str) -> Result<BTreeMap<Weekday, DayNutrition>, AppError> {
    let value = crate::parser::parse(text)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::json_parse("nutrition redo response is not a JSON object"))?;

    let mut changed = BTreeMap::new();
    for day in WEEKDAYS {
        if let Some(raw) = obj.get(day.as_str()) {
            match serde_json::from_value::<DayNutrition>(raw.clone()) {
                Ok(nutrition) => {
                    changed.insert(day, nutrition);
                }
                Err(e) => warn!(day = day.as_str(), "nutrition redo day malformed, keeping previous: {e}"),
            }
        }
    }
    Ok(changed)
}

fn parse_reasons_lenient(text: &str) -> BTreeMap<Weekday, String> {
    let Ok(value) = crate::parser::parse(text) else {
        return BTreeMap::new();
    };
    let Some(obj) = value.as_object() else {
        return BTreeMap::new();
    };

    WEEKDAYS
        .iter()
        .filter_map(|&day| {
            obj.get(day.as_str())
                .and_then(Value::as_str)
                .map(|s| (day, s.to_owned()))
        })
        .collect()
}

/// Run the redo pipeline against `previous`'s days, issuing at most three LLM
/// calls (spec.md §4.8 Redo path). Returns the full seven-day map with only
/// the days the model chose to revise actually changed.
pub async fn run(
    llm: &Arc<dyn LlmClient>,
    previous: &FinalPlanRecord,
    redo: &RedoContext,
) -> Result<BTreeMap<Weekday, PlanDay>, AppError> {
    let mut days = previous.days.clone();

    if matches!(redo.scope, RedoScope::Workout | RedoScope::Both) {
        let previous_workouts: BTreeMap<Weekday, DayWorkout> =
            days.iter().map(|(d, p)| (*d, p.workout.clone())).collect();
        let prompt = prompts::redo::build_workout_redo(&previous_workouts, &redo.reason);
        let text = llm
            .generate(&prompt.system, &prompt.user, prompts::redo::WORKOUT_MAX_TOKENS)
            .await
            .map_err(|e| AppError::new(ErrorCode::WorkoutRedoFailed, e.message))?;
        let changed = parse_partial_workouts(&text)
            .map_err(|e| AppError::new(ErrorCode::WorkoutRedoFailed, e.message))?;
        for (day, workout) in changed {
            if let Some(plan_day) = days.get_mut(&day) {
                plan_day.workout = workout;
            }
        }
    }

    if matches!(redo.scope, RedoScope::Nutrition | RedoScope::Both) {
        let previous_nutrition: BTreeMap<Weekday, DayNutrition> =
            days.iter().map(|(d, p)| (*d, p.nutrition.clone())).collect();
        let prompt = prompts::redo::build_nutrition_redo(&previous_nutrition, &redo.reason);
        let text = llm
            .generate(&prompt.system, &prompt.user, prompts::redo::NUTRITION_MAX_TOKENS)
            .await
            .map_err(|e| AppError::new(ErrorCode::NutritionRedoFailed, e.message))?;
        let changed = parse_partial_nutrition(&text)
            .map_err(|e| AppError::new(ErrorCode::NutritionRedoFailed, e.message))?;
        for (day, nutrition) in changed {
            if let Some(plan_day) = days.get_mut(&day) {
                plan_day.nutrition = nutrition;
            }
        }
    }

    let reasons_prompt = prompts::redo::build_reasons_redo(&redo.reason);
    let reasons = match llm
        .generate(&reasons_prompt.system, &reasons_prompt.user, prompts::redo::REASONS_MAX_TOKENS)
        .await
    {
        Ok(text) => parse_reasons_lenient(&text),
        Err(e) => {
            warn!("redo reasons call failed, using generic fallback: {e}");
            BTreeMap::new()
        }
    };

    for (day, plan_day) in days.iter_mut() {
        if let Some(reason) = reasons.get(day) {
            plan_day.reason = reason.clone();
        } else {
            plan_day.reason = prompts::redo::FALLBACK_REDO_REASON.to_owned();
        }
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::{DayRecovery, Meal, SupplementCard, WorkoutBlock, WorkoutItem};
    use crate::errors::AppError as Err_;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ScriptedLlm {
        responses: Mutex<Vec<Result<String, Err_>>>,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, _system: &str, _user: &str, _max_tokens: u32) -> Result<String, Err_> {
            self.responses.lock().expect("lock").remove(0)
        }
    }

    fn previous_plan() -> FinalPlanRecord {
        let mut days = BTreeMap::new();
        for w in WEEKDAYS {
            days.insert(
                w,
                PlanDay {
                    workout: DayWorkout {
                        focus: vec!["Back".to_owned()],
                        blocks: vec![WorkoutBlock {
                            name: "Main".to_owned(),
                            items: vec![WorkoutItem {
                                exercise: "Row".to_owned(),
                                sets: 4,
                                reps: "8".to_owned(),
                                reps_in_reserve: None,
                                notes: None,
                            }],
                        }],
                    },
                    nutrition: DayNutrition {
                        total_kcal: 2200.0,
                        protein_g: 150.0,
                        carbs_g: None,
                        fats_g: None,
                        meals_per_day: 3,
                        meals: vec![Meal {
                            name: "Lunch".to_owned(),
                            items: Vec::new(),
                        }],
                        hydration_l: 2.5,
                        adjustments: Vec::new(),
                    },
                    recovery: DayRecovery {
                        mobility: Vec::new(),
                        sleep_tips: Vec::new(),
                        supplement_timing_notes: Vec::new(),
                        supplement_card: SupplementCard::default(),
                    },
                    reason: "Old reason".to_owned(),
                },
            );
        }
        FinalPlanRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            days,
            locked: false,
            edit_counts: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn nutrition_only_redo_leaves_every_workout_untouched() {
        let previous = previous_plan();
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm {
            responses: Mutex::new(vec![
                Ok(r#"{"monday": {"totalKcal": 2000, "proteinG": 160, "mealsPerDay": 3, "meals": [], "hydrationL": 2.5, "adjustments": []}}"#.to_owned()),
                Ok(r#"{"monday": "Lighter today per your feedback."}"#.to_owned()),
            ]),
        });
        let redo = RedoContext {
            reason: "too heavy".to_owned(),
            scope: RedoScope::Nutrition,
            source_plan_id: previous.id,
        };

        let merged = run(&llm, &previous, &redo).await.expect("redo succeeds");

        for day in WEEKDAYS {
            assert_eq!(
                merged[&day].workout.blocks[0].items[0].exercise,
                previous.days[&day].workout.blocks[0].items[0].exercise
            );
        }
        assert_eq!(merged[&Weekday::Monday].nutrition.total_kcal, 2000.0);
        assert_eq!(merged[&Weekday::Tuesday].nutrition.total_kcal, 2200.0);
    }

    #[tokio::test]
    async fn workout_redo_failure_surfaces_workout_redo_failed() {
        let previous = previous_plan();
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm {
            responses: Mutex::new(vec![Err(AppError::ai_error("boom"))]),
        });
        let redo = RedoContext {
            reason: "reason".to_owned(),
            scope: RedoScope::Workout,
            source_plan_id: previous.id,
        };

        let err = run(&llm, &previous, &redo).await.expect_err("should fail");
        assert_eq!(err.code, ErrorCode::WorkoutRedoFailed);
    }

    #[tokio::test]
    async fn reasons_call_failure_falls_back_to_generic_reason() {
        let previous = previous_plan();
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm {
            responses: Mutex::new(vec![
                Ok(r#"{"monday": {"totalKcal": 2000, "proteinG": 160, "mealsPerDay": 3, "meals": [], "hydrationL": 2.5, "adjustments": []}}"#.to_owned()),
                Err(AppError::ai_error("down")),
            ]),
        });
        let redo = RedoContext {
            reason: "reason".to_owned(),
            scope: RedoScope::Nutrition,
            source_plan_id: previous.id,
        };

        let merged = run(&llm, &previous, &redo).await.expect("redo still succeeds");
        for day in WEEKDAYS {
            assert_eq!(merged[&day].reason, prompts::redo::FALLBACK_REDO_REASON);
        }
    }
}
