// ABOUTME: JSON recovery parser — repairs malformed LLM output through staged transformations
// ABOUTME: Wholly new functionality; built fresh in the teacher's small-pure-function idiom
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! LLM responses frequently arrive wrapped in Markdown fences, truncated by a
//! token limit, or peppered with the small lexical sins language models make
//! when asked for strict JSON (trailing commas, single quotes, bare keys).
//! `parse` runs a fixed pipeline of independently testable repair stages,
//! attempting a real parse after each one, and only escalates to the next
//! stage on failure (spec.md §4.2).

mod lexical;
mod structural;
mod truncation;

use serde_json::Value;
use tracing::debug;

use crate::errors::AppError;

/// Parse `text` into a JSON value, applying progressively more aggressive
/// repairs until one of the stages yields valid JSON.
///
/// # Errors
///
/// Returns `AppError::json_parse` if no stage produces valid JSON.
pub fn parse(text: &str) -> Result<Value, AppError> {
    let stripped = strip_code_fences(text);
    let candidate = extract_json_region(&stripped);

    if let Ok(value) = serde_json::from_str(&candidate) {
        return Ok(value);
    }

    let lexically_fixed = lexical::apply(&candidate);
    if let Ok(value) = serde_json::from_str(&lexically_fixed) {
        debug!("JSON recovered after lexical fixes");
        return Ok(value);
    }

    let structurally_fixed = structural::apply(&lexically_fixed);
    if let Ok(value) = serde_json::from_str(&structurally_fixed) {
        debug!("JSON recovered after structural fixes");
        return Ok(value);
    }

    let recovered = truncation::recover(&structurally_fixed);
    serde_json::from_str(&recovered).map_err(|e| {
        AppError::json_parse(format!(
            "unable to recover valid JSON after all repair stages: {e}"
        ))
    })
}

/// Stage 1: strip Markdown code fences (` ```json ... ``` ` or bare ` ``` `).
fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed.to_owned();
    };
    let after_open = after_open
        .strip_prefix("json")
        .or_else(|| after_open.strip_prefix("JSON"))
        .unwrap_or(after_open);
    let after_open = after_open.trim_start_matches(['\r', '\n']);
    match after_open.rfind("```") {
        Some(close_idx) => after_open[..close_idx].trim().to_owned(),
        None => after_open.trim().to_owned(),
    }
}

/// Stage 2: extract the largest brace-balanced region, or failing that the
/// longest prefix beginning with `{`.
fn extract_json_region(text: &str) -> String {
    if let Some(region) = largest_brace_balanced_region(text) {
        return region;
    }
    match text.find('{') {
        Some(start) => text[start..].to_owned(),
        None => text.to_owned(),
    }
}

/// Scans for the widest `{...}` span whose braces balance, respecting string
/// literals so braces inside strings don't perturb the count.
fn largest_brace_balanced_region(text: &str) -> Option<String> {
    let bytes: Vec<char> = text.chars().collect();
    let mut best: Option<(usize, usize)> = None;

    let mut start_idx = None;
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape = false;

    for (i, &c) in bytes.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start_idx = Some(i);
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start_idx {
                        let len = i - s;
                        let better = match best {
                            Some((bs, be)) => len > be - bs,
                            None => true,
                        };
                        if better {
                            best = Some((s, i + 1));
                        }
                    }
                    start_idx = None;
                } else if depth < 0 {
                    depth = 0;
                }
            }
            _ => {}
        }
    }

    best.map(|(s, e)| bytes[s..e].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json_block() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence_without_language_tag() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unfenced_text_unchanged() {
        assert_eq!(strip_code_fences("{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn extracts_largest_balanced_region_ignoring_preamble() {
        let text = "Here is your plan:\n{\"a\": {\"b\": 1}}\nHope that helps!";
        assert_eq!(extract_json_region(text), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn extraction_ignores_braces_inside_strings() {
        let text = "{\"note\": \"use {curly} braces\"}";
        assert_eq!(extract_json_region(text), text);
    }

    #[test]
    fn direct_parse_succeeds_on_clean_json() {
        let result = parse(r#"{"a": 1, "b": "two"}"#).expect("valid json parses");
        assert_eq!(result["a"], 1);
        assert_eq!(result["b"], "two");
    }

    #[test]
    fn parse_recovers_fenced_json_with_trailing_comma() {
        let text = "```json\n{\"a\": 1, \"b\": 2,}\n```";
        let result = parse(text).expect("lexical stage repairs trailing comma");
        assert_eq!(result["b"], 2);
    }

    #[test]
    fn parse_fails_on_unrecoverable_garbage() {
        assert!(parse("this is not json at all, just words").is_err());
    }
}
