// ABOUTME: Pipeline orchestrator — the stage-by-stage state machine that turns a profile into a plan
// ABOUTME: Grounded on spec.md §4.8; sequential stages with two budget checks and monotonic checkpoint saves

pub mod convert;
pub mod fallback;
pub mod fanout;
pub mod merge;
pub mod postfix;
pub mod redo;
pub mod verify;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::checkpoint::CheckpointStore;
use crate::config::environment::phase;
use crate::domain::checkpoint::Checkpoint;
use crate::domain::plan::{FinalPlanRecord, WorkoutSplit};
use crate::domain::profile::ProfileSnapshot;
use crate::domain::{RedoContext, Weekday};
use crate::errors::AppError;
use crate::llm::LlmClient;
use crate::nutrition::calculator;
use crate::prompts;

/// Remaining budget for the current invocation, re-evaluated before the two
/// stages the spec names as yield points (spec.md §4.8 "Budget check").
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    pub remaining_ms: i64,
    pub should_yield: bool,
}

/// What one orchestrator run produced. `plan` is present iff `yielded` is
/// false and no fatal error occurred (spec.md §4.8).
pub struct PipelineOutput {
    pub plan: Option<FinalPlanRecord>,
    pub yielded: bool,
}

fn fallback_reasons(split: &WorkoutSplit) -> BTreeMap<Weekday, String> {
    split
        .days
        .iter()
        .map(|(day, split_day)| (*day, prompts::reasons::fallback_reason(split_day.rest, &split_day.focus)))
        .collect()
}

/// Drives a single job's generation or redo pipeline to completion or yield.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    checkpoint_store: Arc<dyn CheckpointStore>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmClient>, checkpoint_store: Arc<dyn CheckpointStore>) -> Self {
        Self { llm, checkpoint_store }
    }

    async fn save_checkpoint(&self, job_id: Uuid, checkpoint: &Checkpoint) {
        if let Err(e) = self.checkpoint_store.save(job_id, checkpoint.phase, checkpoint).await {
            warn!(job_id = %job_id, phase = checkpoint.phase, "checkpoint save failed: {e}");
        }
    }

    /// Run the redo pipeline: at most three LLM calls against `previous`'s
    /// days, no split-first generation at all (spec.md §4.8 "Redo path").
    pub async fn run_redo(
        &self,
        redo_ctx: &RedoContext,
        previous: &FinalPlanRecord,
    ) -> Result<PipelineOutput, AppError> {
        let days = redo::run(&self.llm, previous, redo_ctx).await?;
        let plan = FinalPlanRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            days,
            locked: false,
            edit_counts: previous.edit_counts.clone(),
        };
        Ok(PipelineOutput { plan: Some(plan), yielded: false })
    }

    /// Run the split-first generation pipeline (spec.md §4.8 steps 1-10),
    /// resuming from whatever phase `checkpoint` already reached. `time_budget`
    /// is called at the two points the spec designates as yield checks.
    pub async fn run(
        &self,
        job_id: Uuid,
        profile: &ProfileSnapshot,
        mut checkpoint: Checkpoint,
        time_budget: impl Fn() -> TimeBudget,
    ) -> Result<PipelineOutput, AppError> {
        let bmr = calculator::calculate_bmr(profile);
        let tdee = calculator::calculate_tdee(bmr, profile.activity_level);
        let calorie_target = calculator::calculate_calorie_target(profile, tdee);
        let protein_target = calculator::calculate_protein_target(profile, calorie_target);

        // Stage 0 — Split
        if !checkpoint.reached(phase::SPLIT_COMPLETE) {
            let prompt = prompts::split::build(profile);
            let text = self
                .llm
                .generate(&prompt.system, &prompt.user, 2000)
                .await?;
            let split = convert::parse_split(&text, profile)?;
            checkpoint.workout_split = Some(split);
            checkpoint.phase = phase::SPLIT_COMPLETE;
            self.save_checkpoint(job_id, &checkpoint).await;
        }
        let split = checkpoint
            .workout_split
            .clone()
            .ok_or_else(|| AppError::generation("missing workout split after stage 0"))?;

        // Stage 1 — Base Nutrition
        if !checkpoint.reached(phase::BASE_NUTRITION_COMPLETE) {
            let prompt = prompts::base_nutrition::build(profile, calorie_target, protein_target);
            let text = self
                .llm
                .generate(&prompt.system, &prompt.user, 3000)
                .await?;
            let base = convert::parse_base_nutrition(&text)?;
            checkpoint.base_nutrition = Some(base);
            checkpoint.phase = phase::BASE_NUTRITION_COMPLETE;
            self.save_checkpoint(job_id, &checkpoint).await;
        }
        let base = checkpoint
            .base_nutrition
            .clone()
            .ok_or_else(|| AppError::generation("missing base nutrition after stage 1"))?;

        // Budget check (spec.md §4.8 step 3)
        if time_budget().should_yield {
            return Ok(PipelineOutput { plan: None, yielded: true });
        }

        // Stage 2 — Parallel fan-out
        if !checkpoint.reached(phase::SUPPLEMENTS_COMPLETE) {
            let result = fanout::run(&self.llm, &split, &base, profile).await;
            checkpoint.daily_workouts = Some(result.daily_workouts);
            checkpoint.daily_nutrition = Some(result.daily_nutrition);
            checkpoint.nutrition_deltas = Some(result.nutrition_deltas);
            checkpoint.supplements_data = Some(result.supplements);
            checkpoint.phase = phase::SUPPLEMENTS_COMPLETE;
            self.save_checkpoint(job_id, &checkpoint).await;
        }

        // Budget check (spec.md §4.8 step 5)
        if time_budget().should_yield {
            return Ok(PipelineOutput { plan: None, yielded: true });
        }

        let daily_workouts = checkpoint.daily_workouts.clone().unwrap_or_default();
        let supplements = checkpoint.supplements_data.clone().unwrap_or_default();

        // Stage 3 — Verification
        if !checkpoint.reached(phase::VERIFIERS_COMPLETE) {
            let mut daily_nutrition = checkpoint.daily_nutrition.clone().unwrap_or_default();
            verify::run(
                &self.llm,
                &daily_workouts,
                &mut daily_nutrition,
                &supplements,
                calorie_target,
                protein_target,
            )
            .await;
            checkpoint.daily_nutrition = Some(daily_nutrition);
            checkpoint.phase = phase::VERIFIERS_COMPLETE;
            self.save_checkpoint(job_id, &checkpoint).await;
        }
        let daily_nutrition = checkpoint.daily_nutrition.clone().unwrap_or_default();

        // Stage 4 — Reasons
        if !checkpoint.reached(phase::REASONS_COMPLETE) {
            let prompt = prompts::reasons::build(&split, &supplements.recommended_add_ons);
            let reasons = match self
                .llm
                .generate(&prompt.system, &prompt.user, prompts::reasons::MAX_TOKENS)
                .await
            {
                Ok(text) => convert::parse_reasons(&text).unwrap_or_else(|e| {
                    warn!("reasons response could not be parsed, using deterministic fallback: {e}");
                    fallback_reasons(&split)
                }),
                Err(e) => {
                    warn!("reasons call failed, using deterministic fallback: {e}");
                    fallback_reasons(&split)
                }
            };
            checkpoint.daily_reasons = Some(reasons);
            checkpoint.phase = phase::REASONS_COMPLETE;
            self.save_checkpoint(job_id, &checkpoint).await;
        }
        let daily_reasons = checkpoint.daily_reasons.clone().unwrap_or_default();

        // Merge (spec.md §4.8 step 8)
        let mut days = merge::merge(&daily_workouts, &daily_nutrition, &daily_reasons, &supplements, &base);

        // Post-fix (spec.md §4.8 step 9)
        postfix::apply(&mut days, profile, calorie_target, protein_target);

        let plan = FinalPlanRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            days,
            locked: false,
            edit_counts: BTreeMap::new(),
        };

        Ok(PipelineOutput { plan: Some(plan), yielded: false })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedLlm {
        responses: Mutex<Vec<Result<String, AppError>>>,
        call_count: AtomicUsize,
        system_prompts_seen: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String, AppError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                call_count: AtomicUsize::new(0),
                system_prompts_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, system: &str, _user: &str, _max_tokens: u32) -> Result<String, AppError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.system_prompts_seen.lock().expect("lock").push(system.to_owned());
            let mut responses = self.responses.lock().expect("lock");
            if responses.is_empty() {
                return Ok(r#"{}"#.to_owned());
            }
            responses.remove(0)
        }
    }

    struct NullCheckpointStore;

    #[async_trait]
    impl CheckpointStore for NullCheckpointStore {
        async fn save(&self, _job_id: Uuid, _phase: i32, _payload: &Checkpoint) -> Result<(), AppError> {
            Ok(())
        }

        async fn load(&self, _job_id: Uuid) -> Result<Option<Checkpoint>, AppError> {
            Ok(None)
        }
    }

    fn profile() -> ProfileSnapshot {
        ProfileSnapshot {
            goal: crate::domain::profile::Goal::GeneralFitness,
            training_days_per_week: 4,
            equipment: HashSet::new(),
            dietary_preferences: HashSet::new(),
            meal_count: 3,
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

    fn split_json() -> String {
        let day = r#"{"rest": false, "focus": ["Full body"], "intensity": "moderate"}"#;
        format!(
            r#"{{"monday": {day}, "tuesday": {day}, "wednesday": {day}, "thursday": {day}, "friday": {{"rest": true, "focus": ["Rest","Recovery"], "intensity": "rest"}}, "saturday": {{"rest": true, "focus": ["Rest","Recovery"], "intensity": "rest"}}, "sunday": {{"rest": true, "focus": ["Rest","Recovery"], "intensity": "rest"}}}}"#
        )
    }

    fn base_nutrition_json() -> &'static str {
        r#"{"calories": 2200, "protein": 150, "carbs": 220, "fats": 70, "mealsPerDay": 3, "hydrationL": 2.5, "mealTemplates": []}"#
    }

    fn never_yield() -> TimeBudget {
        TimeBudget {
            remaining_ms: 100_000,
            should_yield: false,
        }
    }

    #[tokio::test]
    async fn full_run_produces_a_plan_with_all_seven_weekdays() {
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm::new(vec![
            Ok(split_json()),
            Ok(base_nutrition_json().to_owned()),
        ]));
        let orchestrator = Orchestrator::new(llm, Arc::new(NullCheckpointStore));
        let output = orchestrator
            .run(Uuid::new_v4(), &profile(), Checkpoint::default(), never_yield)
            .await
            .expect("pipeline succeeds");

        assert!(!output.yielded);
        let plan = output.plan.expect("plan present when not yielded");
        assert!(plan.has_all_weekdays());
    }

    #[tokio::test]
    async fn resumption_skips_stage_0_when_checkpoint_already_past_it() {
        let mut resumed = Checkpoint {
            phase: phase::BASE_NUTRITION_COMPLETE,
            ..Checkpoint::default()
        };
        let split: WorkoutSplit = serde_json::from_str(&split_json()).expect("split parses");
        resumed.workout_split = Some(split);
        resumed.base_nutrition =
            Some(serde_json::from_str(base_nutrition_json()).expect("base nutrition parses"));

        let llm = Arc::new(ScriptedLlm::new(Vec::new()));
        let orchestrator = Orchestrator::new(llm.clone(), Arc::new(NullCheckpointStore));
        let output = orchestrator
            .run(Uuid::new_v4(), &profile(), resumed, never_yield)
            .await
            .expect("pipeline succeeds");

        assert!(!output.yielded);
        assert!(llm.call_count.load(Ordering::SeqCst) > 0);
        let seen = llm.system_prompts_seen.lock().expect("lock");
        assert!(
            !seen.iter().any(|p| p.contains("seven-day training split")),
            "resumption must not re-issue the stage-0 split call"
        );
        assert!(
            !seen.iter().any(|p| p.contains("baseline daily nutrition")),
            "resumption must not re-issue the stage-1 base-nutrition call"
        );
    }

    #[tokio::test]
    async fn budget_yield_before_fan_out_returns_no_plan() {
        let llm: Arc<dyn LlmClient> = Arc::new(ScriptedLlm::new(vec![
            Ok(split_json()),
            Ok(base_nutrition_json().to_owned()),
        ]));
        let orchestrator = Orchestrator::new(llm, Arc::new(NullCheckpointStore));
        let output = orchestrator
            .run(Uuid::new_v4(), &profile(), Checkpoint::default(), || TimeBudget {
                remaining_ms: 1_000,
                should_yield: true,
            })
            .await
            .expect("pipeline succeeds");

        assert!(output.yielded);
        assert!(output.plan.is_none());
    }
}
