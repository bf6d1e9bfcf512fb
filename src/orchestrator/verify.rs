// ABOUTME: Stage 3 verification — per-day workout/nutrition verifiers plus one supplements verifier
// ABOUTME: Logs-only for workout/supplements findings; nutrition verification can clamp a day's stated totals

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use super::convert::{self, VerifierVerdict};
use crate::domain::plan::{DayNutrition, DayWorkout};
use crate::domain::Weekday;
use crate::llm::LlmClient;
use crate::nutrition::food_estimator;
use crate::prompts;

/// Clamp window the spec gives explicitly for calories; applied whenever the
/// verifier's returned calculated total disagrees with the stated one by
/// more than the 200 kcal threshold the nutrition verifier prompt enforces
/// (spec.md §4.8 Stage 3).
const CALORIE_CLAMP_HALF_WIDTH: f64 = 100.0;

/// The spec gives only a 20 g *threshold* for protein disagreement, not an
/// explicit clamp interval the way it does for calories. Mirroring the
/// calorie clamp's shape with the same half-width as the disagreement
/// threshold is the narrowest reading that still keeps the corrected value
/// close to the target (documented as a design decision, not spelled out
/// verbatim in spec.md §4.8 Stage 3).
const PROTEIN_CLAMP_HALF_WIDTH: f64 = 20.0;

/// Token budget for a verifier call — its response is a short `isValid` +
/// `errors` object, nowhere near the size of a generation call.
const VERIFIER_MAX_TOKENS: u32 = 500;

fn clamp(value: f64, center: f64, half_width: f64) -> f64 {
    value.max(center - half_width).min(center + half_width)
}

/// Run Stage 3 verification over every fanned-out artifact. Workout and
/// supplements findings are logged only — the spec gives them no corrective
/// action, just a durable verifier pass (spec.md §4.5 Verifiers). Nutrition
/// findings beyond the calculated/stated disagreement thresholds clamp the
/// day's totals toward the caller-supplied targets in place.
///
/// Every workout verifier, the supplements verifier, and every nutrition
/// verifier are launched concurrently under `JoinSet` barriers, mirroring
/// the Stage 2 fan-out's concurrency contract (spec.md §4.8 Stage 3
/// "Launch concurrently").
pub async fn run(
    llm: &Arc<dyn LlmClient>,
    daily_workouts: &BTreeMap<Weekday, DayWorkout>,
    daily_nutrition: &mut BTreeMap<Weekday, DayNutrition>,
    supplements: &crate::domain::checkpoint::SupplementsData,
    calorie_target: f64,
    protein_target: f64,
) {
    let mut workout_tasks = JoinSet::new();
    for (day, workout) in daily_workouts.clone() {
        let llm = llm.clone();
        workout_tasks.spawn(async move {
            let prompt = prompts::verifiers::build_workout_verifier(&workout);
            (day, call_verifier(&llm, &prompt).await)
        });
    }

    let supplements_handle = {
        let llm = llm.clone();
        let recommended_add_ons = supplements.recommended_add_ons.clone();
        tokio::spawn(async move {
            let prompt = prompts::verifiers::build_supplements_verifier(&recommended_add_ons, &[]);
            call_verifier(&llm, &prompt).await
        })
    };

    let mut nutrition_tasks = JoinSet::new();
    for (day, nutrition) in daily_nutrition.iter() {
        let llm = llm.clone();
        let day = *day;
        let nutrition = nutrition.clone();
        nutrition_tasks.spawn(async move {
            let (calculated_kcal, calculated_protein, _) = food_estimator::estimate_meals(
                &nutrition.meals.iter().flat_map(|m| m.items.clone()).collect::<Vec<_>>(),
            );
            let prompt = prompts::verifiers::build_nutrition_verifier(&nutrition, calculated_kcal, calculated_protein);
            let verdict = call_verifier(&llm, &prompt).await;
            (day, verdict, calculated_kcal, calculated_protein)
        });
    }

    while let Some(outcome) = workout_tasks.join_next().await {
        match outcome {
            Ok((day, verdict)) if !verdict.is_valid => {
                warn!(day = day.as_str(), errors = ?verdict.errors, "workout verifier flagged issues");
            }
            Ok(_) => {}
            Err(join_err) => warn!("workout verifier task panicked: {join_err}"),
        }
    }

    match supplements_handle.await {
        Ok(verdict) if !verdict.is_valid => {
            warn!(errors = ?verdict.errors, "supplements verifier flagged issues");
        }
        Ok(_) => {}
        Err(join_err) => warn!("supplements verifier task panicked: {join_err}"),
    }

    while let Some(outcome) = nutrition_tasks.join_next().await {
        let (day, verdict, calculated_kcal, calculated_protein) = match outcome {
            Ok(result) => result,
            Err(join_err) => {
                warn!("nutrition verifier task panicked: {join_err}");
                continue;
            }
        };

        if !verdict.is_valid {
            warn!(day = day.as_str(), errors = ?verdict.errors, "nutrition verifier flagged issues");
        }

        let Some(nutrition) = daily_nutrition.get_mut(&day) else {
            continue;
        };

        // The spec keys the disagreement on the verifier's own returned
        // `calculatedCalories`/`calculatedProtein`; fall back to the
        // precomputed Food Estimator figure when the verifier omitted it
        // (e.g. the call failed and was downgraded to a valid no-op).
        let effective_kcal = verdict.calculated_kcal.unwrap_or(calculated_kcal);
        let effective_protein = verdict.calculated_protein.unwrap_or(calculated_protein);

        let kcal_disagreement = (effective_kcal - nutrition.total_kcal).abs();
        if kcal_disagreement > 200.0 {
            let corrected = clamp(nutrition.total_kcal, calorie_target, CALORIE_CLAMP_HALF_WIDTH);
            warn!(
                day = day.as_str(),
                stated = nutrition.total_kcal,
                calculated = effective_kcal,
                corrected,
                "calorie disagreement exceeded 200 kcal, clamping toward target"
            );
            nutrition.total_kcal = corrected;
        }

        let protein_disagreement = (effective_protein - nutrition.protein_g).abs();
        if protein_disagreement > 20.0 {
            let corrected = clamp(nutrition.protein_g, protein_target, PROTEIN_CLAMP_HALF_WIDTH);
            warn!(
                day = day.as_str(),
                stated = nutrition.protein_g,
                calculated = effective_protein,
                corrected,
                "protein disagreement exceeded 20g, clamping toward target"
            );
            nutrition.protein_g = corrected;
        }
    }
}

async fn call_verifier(llm: &Arc<dyn LlmClient>, prompt: &prompts::PromptPair) -> VerifierVerdict {
    match llm.generate(&prompt.system, &prompt.user, VERIFIER_MAX_TOKENS).await {
        Ok(text) => convert::parse_verifier(&text),
        Err(e) => {
            warn!("verifier call failed, treating as valid: {e}");
            VerifierVerdict {
                is_valid: true,
                ..VerifierVerdict::default()
            }
        }
    }
}
