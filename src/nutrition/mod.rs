// ABOUTME: Nutrition module root — calorie/macro calculator and static food estimator
// ABOUTME: Grounded on the teacher's intelligence/nutrition_calculator.rs, re-specified constants

pub mod calculator;
pub mod food_estimator;

pub use calculator::{calculate_bmr, calculate_calorie_target, calculate_protein_target, calculate_tdee};
pub use food_estimator::{estimate, estimate_meals, MealEstimate};
