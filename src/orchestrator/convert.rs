// ABOUTME: LLM response -> domain struct conversion, one function per stage's expected shape
// ABOUTME: Split/base-nutrition/daily calls parse strictly; supplements/reasons tolerate partial JSON

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::domain::checkpoint::SupplementsData;
use crate::domain::plan::{BaseNutrition, DayNutrition, DayWorkout, SplitDay, WorkoutSplit};
use crate::domain::profile::ProfileSnapshot;
use crate::domain::WEEKDAYS;
use crate::errors::AppError;

/// Parse the Stage 0 split response into a [`WorkoutSplit`]. The wire shape
/// is a flat object keyed by weekday, not wrapped in a `"days"` field, so
/// this reads each key directly rather than deserializing the whole object
/// in one shot. A weekday the model omitted (or returned malformed) falls
/// back to [`SplitDay::rest_skeleton`] rather than failing the whole stage —
/// but a logged mismatch is the only correction applied (spec.md §9).
pub fn parse_split(text: &str, profile: &ProfileSnapshot) -> Result<WorkoutSplit, AppError> {
    let value = crate::parser::parse(text)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::json_parse("split response is not a JSON object"))?;

    let mut days = BTreeMap::new();
    for day in WEEKDAYS {
        let split_day = obj
            .get(day.as_str())
            .cloned()
            .and_then(|v| serde_json::from_value::<SplitDay>(v).ok())
            .unwrap_or_else(SplitDay::rest_skeleton);
        days.insert(day, split_day);
    }

    let split = WorkoutSplit { days };
    let actual = split.non_rest_day_count();
    if actual as u8 != profile.training_days_per_week {
        warn!(
            expected = profile.training_days_per_week,
            actual, "split's non-rest day count disagrees with the profile's declared count"
        );
    }

    Ok(split)
}

/// Parse the Stage 1 base-nutrition response (spec.md §4.5 Base Nutrition).
/// A hard parse failure here propagates — Stage 1 is one of the stages
/// spec.md §7 has abort on bubble.
pub fn parse_base_nutrition(text: &str) -> Result<BaseNutrition, AppError> {
    let value = crate::parser::parse(text)?;
    Ok(serde_json::from_value(value)?)
}

/// Parse a single day's workout response (spec.md §4.5 Daily Workout).
pub fn parse_day_workout(text: &str) -> Result<DayWorkout, AppError> {
    let value = crate::parser::parse(text)?;
    Ok(serde_json::from_value(value)?)
}

/// Parse a single day's nutrition response (spec.md §4.5 Nutrition Adjustment).
pub fn parse_day_nutrition(text: &str) -> Result<DayNutrition, AppError> {
    let value = crate::parser::parse(text)?;
    Ok(serde_json::from_value(value)?)
}

fn string_array(obj: Option<&serde_json::Map<String, Value>>, key: &str) -> Vec<String> {
    obj.and_then(|o| o.get(key))
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse the weekly supplements response. Unlike the split/daily stages,
/// field access here is tolerant: a missing or malformed per-day section
/// yields empty lists for that day rather than failing the whole call, since
/// this call's failure mode is already a deterministic fallback at the
/// caller (spec.md §4.8 Stage 2).
pub fn parse_supplements(text: &str) -> Result<SupplementsData, AppError> {
    let value = crate::parser::parse(text)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::json_parse("supplements response is not a JSON object"))?;

    let recommended_add_ons = string_array(Some(obj), "recommendedAddOns");

    let mut per_day_mobility = BTreeMap::new();
    let mut per_day_sleep_tips = BTreeMap::new();
    let mut per_day_timing_notes = BTreeMap::new();

    for day in WEEKDAYS {
        let day_obj = obj.get(day.as_str()).and_then(Value::as_object);
        per_day_mobility.insert(day, string_array(day_obj, "mobility"));
        per_day_sleep_tips.insert(day, string_array(day_obj, "sleepTips"));
        per_day_timing_notes.insert(day, string_array(day_obj, "supplementTimingNotes"));
    }

    Ok(SupplementsData {
        recommended_add_ons,
        per_day_cards: BTreeMap::new(),
        per_day_mobility,
        per_day_sleep_tips,
        per_day_timing_notes,
    })
}

/// Parse the Stage 4 reasons response into a complete per-weekday map. Any
/// weekday missing or not a string fails the whole call so the caller
/// applies the deterministic fallback uniformly rather than mixing
/// model-written and fallback blurbs within the same week.
pub fn parse_reasons(text: &str) -> Result<BTreeMap<crate::domain::Weekday, String>, AppError> {
    let value = crate::parser::parse(text)?;
    let obj = value
        .as_object()
        .ok_or_else(|| AppError::json_parse("reasons response is not a JSON object"))?;

    let mut reasons = BTreeMap::new();
    for day in WEEKDAYS {
        let reason = obj
            .get(day.as_str())
            .and_then(Value::as_str)
            .ok_or_else(|| AppError::json_parse(format!("reasons response missing {}", day.as_str())))?;
        reasons.insert(day, reason.to_owned());
    }

    Ok(reasons)
}

/// Parsed shape common to all three verifier prompts (spec.md §4.5 Verifiers).
#[derive(Debug, Clone, Default)]
pub struct VerifierVerdict {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub calculated_kcal: Option<f64>,
    pub calculated_protein: Option<f64>,
}

/// Parse a verifier response. Unlike the stage parsers above, a failure here
/// defaults to `is_valid: true` with no errors — a verifier that cannot be
/// read is treated as "nothing to flag," never as a reason to discard the
/// artifact it was checking (spec.md §4.8 Stage 3 is non-aborting).
pub fn parse_verifier(text: &str) -> VerifierVerdict {
    let value = match crate::parser::parse(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("verifier response could not be parsed, treating as valid: {e}");
            return VerifierVerdict {
                is_valid: true,
                ..VerifierVerdict::default()
            };
        }
    };

    let is_valid = value.get("isValid").and_then(Value::as_bool).unwrap_or(true);
    let errors = value
        .get("errors")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_owned)).collect())
        .unwrap_or_default();
    let calculated_kcal = value.get("calculatedCalories").and_then(Value::as_f64);
    let calculated_protein = value.get("calculatedProtein").and_then(Value::as_f64);

    VerifierVerdict {
        is_valid,
        errors,
        calculated_kcal,
        calculated_protein,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::Goal;
    use std::collections::HashSet;

    fn profile(training_days: u8) -> ProfileSnapshot {
        ProfileSnapshot {
            goal: Goal::GeneralFitness,
            training_days_per_week: training_days,
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

    #[test]
    fn split_fills_missing_weekdays_with_rest_skeleton() {
        let text = r#"{"monday": {"rest": false, "focus": ["Chest"], "intensity": "high"}}"#;
        let split = parse_split(text, &profile(1)).expect("parses");
        assert_eq!(split.days.len(), 7);
        assert!(split.days[&crate::domain::Weekday::Tuesday].rest);
    }

    #[test]
    fn supplements_tolerates_a_missing_day_section() {
        let text = r#"{"recommendedAddOns": ["creatine"], "monday": {"mobility": ["hip openers"]}}"#;
        let data = parse_supplements(text).expect("parses");
        assert_eq!(data.recommended_add_ons, vec!["creatine".to_owned()]);
        assert_eq!(
            data.per_day_mobility[&crate::domain::Weekday::Monday],
            vec!["hip openers".to_owned()]
        );
        assert!(data.per_day_mobility[&crate::domain::Weekday::Tuesday].is_empty());
    }

    #[test]
    fn reasons_requires_every_weekday() {
        let text = r#"{"monday": "Push day"}"#;
        assert!(parse_reasons(text).is_err());
    }

    #[test]
    fn verifier_defaults_to_valid_on_parse_failure() {
        let verdict = parse_verifier("not json at all");
        assert!(verdict.is_valid);
        assert!(verdict.errors.is_empty());
    }

    #[test]
    fn verifier_reads_calculated_values() {
        let text = r#"{"isValid": false, "errors": ["too high"], "calculatedCalories": 2200, "calculatedProtein": 150}"#;
        let verdict = parse_verifier(text);
        assert!(!verdict.is_valid);
        assert_eq!(verdict.calculated_kcal, Some(2200.0));
        assert_eq!(verdict.calculated_protein, Some(150.0));
    }
}
