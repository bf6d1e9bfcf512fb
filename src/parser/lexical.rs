// ABOUTME: Lexical repair stage — token-level fixes that don't require tracking nesting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
static BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)(\s*:)"#).expect("valid regex"));
static DOUBLE_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*,").expect("valid regex"));
static EMPTY_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*(,|\})").expect("valid regex"));
static ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.\.\.+").expect("valid regex"));

/// Apply all lexical fixes in sequence (spec.md §4.2 step 4). Each
/// sub-transform is idempotent in isolation.
pub fn apply(text: &str) -> String {
    let text = strip_control_characters(text);
    let text = ELLIPSIS.replace_all(&text, "").into_owned();
    let text = single_to_double_quotes(&text);
    let text = BARE_KEY.replace_all(&text, "$1\"$2\"$3").into_owned();
    let text = collapse_double_commas(&text);
    let text = TRAILING_COMMA.replace_all(&text, "$1").into_owned();
    plug_empty_values(&text)
}

/// Removes ASCII control characters (except the JSON-significant whitespace
/// `\n`, `\r`, `\t`) that LLMs sometimes emit inside otherwise-valid JSON.
fn strip_control_characters(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Converts single-quoted string literals to double-quoted ones. Only runs
/// when the text contains no double quotes at all, which is the only case
/// where this transform can't corrupt an already-valid mixed-quote string.
fn single_to_double_quotes(text: &str) -> String {
    if text.contains('"') {
        return text.to_owned();
    }
    text.replace('\'', "\"")
}

fn collapse_double_commas(text: &str) -> String {
    let mut out = text.to_owned();
    while DOUBLE_COMMA.is_match(&out) {
        out = DOUBLE_COMMA.replace_all(&out, ",").into_owned();
    }
    out
}

/// Plugs a missing value after `:` (e.g. `"key": ,` or `"key": }`) with `null`.
fn plug_empty_values(text: &str) -> String {
    EMPTY_VALUE.replace_all(text, ": null$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_trailing_comma_before_closer() {
        assert_eq!(apply(r#"{"a": 1,}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn quotes_bare_keys() {
        assert_eq!(apply(r#"{a: 1, b: 2}"#), r#"{"a": 1, "b": 2}"#);
    }

    #[test]
    fn converts_single_quotes_when_no_double_quotes_present() {
        assert_eq!(apply("{'a': 'one'}"), r#"{"a": "one"}"#);
    }

    #[test]
    fn leaves_mixed_quote_text_untouched_by_quote_conversion() {
        let text = r#"{"a": "it's fine"}"#;
        assert_eq!(single_to_double_quotes(text), text);
    }

    #[test]
    fn collapses_double_commas() {
        assert_eq!(apply(r#"{"a": [1,, 2]}"#), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn plugs_empty_value_with_null() {
        assert_eq!(apply(r#"{"a": , "b": 1}"#), r#"{"a": null, "b": 1}"#);
    }

    #[test]
    fn strips_ellipses() {
        assert_eq!(apply(r#"{"a": 1, ...}"#), r#"{"a": 1}"#);
    }
}
