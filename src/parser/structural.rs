// ABOUTME: Structural repair stage — fixes that require scanning adjacency across tokens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::LazyLock;

use regex::Regex;

static MISSING_COMMA_AFTER_CLOSER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([}\]])\s*\n\s*(["{\[])"#).expect("valid regex"));
static MISSING_COMMA_BETWEEN_STRINGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""\s*\n\s*"(?P<key>[^"]*"\s*:)"#).expect("valid regex"));
static MISSING_COMMA_AFTER_SCALAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(-?\d+(?:\.\d+)?|true|false|null)\s*\n\s*""#).expect("valid regex")
});

/// Apply structural fixes (spec.md §4.2 step 6): insert commas the model
/// dropped between adjacent values, and unescape/quote string-level issues.
pub fn apply(text: &str) -> String {
    let text = MISSING_COMMA_AFTER_CLOSER
        .replace_all(text, "$1,\n$2")
        .into_owned();
    let text = MISSING_COMMA_BETWEEN_STRINGS
        .replace_all(&text, "\",\n\"${key}")
        .into_owned();
    MISSING_COMMA_AFTER_SCALAR
        .replace_all(&text, "$1,\n\"")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_comma_between_adjacent_closer_and_opener() {
        let text = "{\"a\": {\"x\": 1}\n\"b\": 2}";
        let fixed = apply(text);
        assert!(fixed.contains("1},\n\"b\""));
    }

    #[test]
    fn inserts_comma_after_scalar_followed_by_string() {
        let text = "{\"a\": 1\n\"b\": \"two\"}";
        let fixed = apply(text);
        assert!(fixed.contains("1,\n\"b\""));
    }
}
