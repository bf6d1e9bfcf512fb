// ABOUTME: Static food-table estimator — kcal/protein per 100g lookup with unit normalization
// ABOUTME: Wholly new; built fresh in the teacher's static-reference-table idiom
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! No teacher module estimates food macros; this follows the general
//! "static reference table + lookup function" shape the teacher uses for
//! other physiological constants, sized for the ~50 foods the prompt
//! pipeline's meal templates actually reference (spec.md §4.4).

use crate::domain::plan::FoodItem;

/// `(kcal, protein_g)` per 100 g, keyed by lowercase food name. Order matters
/// — lookup is case-insensitive substring match against keys in this order,
/// so more specific names should precede their generic substrings.
const FOOD_TABLE: &[(&str, f64, f64)] = &[
    ("chicken breast", 165.0, 31.0),
    ("chicken thigh", 209.0, 26.0),
    ("chicken", 239.0, 27.0),
    ("salmon", 208.0, 20.0),
    ("tuna", 132.0, 28.0),
    ("shrimp", 99.0, 24.0),
    ("white fish", 90.0, 20.0),
    ("fish", 105.0, 20.0),
    ("beef mince", 254.0, 26.0),
    ("beef steak", 271.0, 25.0),
    ("beef", 250.0, 26.0),
    ("pork", 242.0, 27.0),
    ("turkey", 135.0, 29.0),
    ("egg white", 52.0, 11.0),
    ("egg", 155.0, 13.0),
    ("tofu", 76.0, 8.0),
    ("paneer", 265.0, 18.0),
    ("tempeh", 193.0, 19.0),
    ("lentils", 116.0, 9.0),
    ("chickpeas", 164.0, 9.0),
    ("black beans", 132.0, 9.0),
    ("kidney beans", 127.0, 9.0),
    ("greek yogurt", 59.0, 10.0),
    ("yogurt", 61.0, 3.5),
    ("cottage cheese", 98.0, 11.0),
    ("cheese", 402.0, 25.0),
    ("milk", 42.0, 3.4),
    ("whey protein", 380.0, 80.0),
    ("protein powder", 370.0, 75.0),
    ("brown rice", 123.0, 2.7),
    ("white rice", 130.0, 2.7),
    ("rice", 130.0, 2.7),
    ("quinoa", 120.0, 4.4),
    ("oats", 389.0, 16.9),
    ("whole wheat bread", 247.0, 13.0),
    ("bread", 265.0, 9.0),
    ("pasta", 131.0, 5.0),
    ("sweet potato", 86.0, 1.6),
    ("potato", 77.0, 2.0),
    ("banana", 89.0, 1.1),
    ("apple", 52.0, 0.3),
    ("berries", 57.0, 0.7),
    ("broccoli", 34.0, 2.8),
    ("spinach", 23.0, 2.9),
    ("mixed vegetables", 65.0, 2.5),
    ("salad", 20.0, 1.5),
    ("almonds", 579.0, 21.0),
    ("peanut butter", 588.0, 25.0),
    ("olive oil", 884.0, 0.0),
    ("avocado", 160.0, 2.0),
    ("hummus", 166.0, 8.0),
];

/// Used when no table entry matches the food name by substring.
const FALLBACK_KCAL_PER_100G: f64 = 150.0;
const FALLBACK_PROTEIN_PER_100G: f64 = 8.0;

/// Macro estimate for a single food quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MealEstimate {
    pub kcal: f64,
    pub protein_g: f64,
}

/// Estimate kcal/protein for one `(food, quantity)` pair (spec.md §4.4).
/// `quantity` is parsed as a leading number plus a unit token, normalized to
/// grams, then scaled against the per-100g table value.
#[must_use]
pub fn estimate(food: &str, quantity: &str) -> MealEstimate {
    let grams = normalize_to_grams(quantity);
    let (kcal_per_100g, protein_per_100g) = lookup(food);
    let scale = grams / 100.0;
    MealEstimate {
        kcal: kcal_per_100g * scale,
        protein_g: protein_per_100g * scale,
    }
}

/// Sum estimates across a list of `(food, quantity)` items, keeping a
/// per-item breakdown (spec.md §4.4 `estimateMeals`).
#[must_use]
pub fn estimate_meals(items: &[FoodItem]) -> (f64, f64, Vec<MealEstimate>) {
    let breakdown: Vec<MealEstimate> = items
        .iter()
        .map(|item| estimate(&item.food, &item.quantity))
        .collect();
    let total_kcal = breakdown.iter().map(|e| e.kcal).sum();
    let total_protein = breakdown.iter().map(|e| e.protein_g).sum();
    (total_kcal, total_protein, breakdown)
}

fn lookup(food: &str) -> (f64, f64) {
    let lower = food.to_lowercase();
    FOOD_TABLE
        .iter()
        .find(|(key, _, _)| lower.contains(key))
        .map_or((FALLBACK_KCAL_PER_100G, FALLBACK_PROTEIN_PER_100G), |(_, kcal, protein)| {
            (*kcal, *protein)
        })
}

/// Parses a leading number and unit token from a quantity string, converting
/// to grams (spec.md §4.4 conversion table). Unitless numbers are grams.
fn normalize_to_grams(quantity: &str) -> f64 {
    let trimmed = quantity.trim();
    let split_at = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number_part, unit_part) = trimmed.split_at(split_at);
    let number: f64 = number_part.trim().parse().unwrap_or(1.0);
    let unit = unit_part.trim().to_lowercase();

    let grams_per_unit = match unit.as_str() {
        "oz" | "ounce" | "ounces" => 28.35,
        "cup" | "cups" => 240.0,
        "tbsp" | "tablespoon" | "tablespoons" => 15.0,
        "tsp" | "teaspoon" | "teaspoons" => 5.0,
        "slice" | "slices" => 30.0,
        "piece" | "pieces" => 100.0,
        "scoop" | "scoops" => 30.0,
        "ml" | "milliliter" | "milliliters" => 1.0,
        "l" | "liter" | "liters" => 1000.0,
        _ => 1.0,
    };

    number * grams_per_unit
}
