// ABOUTME: Truncation repair stage — closes braces/brackets left open by a cut-off response
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Recover a best-effort valid JSON document from text truncated mid-stream
/// (spec.md §4.2 step 8): drop an incomplete trailing string or key:value
/// tail, then close any unterminated string and append closing brackets in
/// the amount needed to balance the nesting depth seen while scanning.
pub fn recover(text: &str) -> String {
    let trimmed = drop_incomplete_tail(text);
    let (in_string, depth_braces, depth_brackets) = scan_nesting(&trimmed);

    let mut out = trimmed;
    if in_string {
        out.push('"');
    }
    out = strip_trailing_commas_before_close(&out);

    for _ in 0..depth_brackets {
        out.push(']');
        out = strip_trailing_commas_before_close(&out);
    }
    for _ in 0..depth_braces {
        out.push('}');
        out = strip_trailing_commas_before_close(&out);
    }
    out
}

/// Removes an incomplete trailing string literal, an incomplete trailing
/// object/array element, or an incomplete `"key":` tail with no value.
fn drop_incomplete_tail(text: &str) -> String {
    let mut out = text.trim_end().to_owned();

    // An unterminated string at the very end (odd number of unescaped quotes
    // from the last complete structural boundary) gets dropped entirely
    // rather than force-closed, since its content is unknown-truncated.
    if ends_with_dangling_key_colon(&out) {
        if let Some(idx) = out.rfind(',') {
            out.truncate(idx);
        } else if let Some(idx) = out.rfind(['{', '[']) {
            out.truncate(idx + 1);
        }
    }

    out
}

fn ends_with_dangling_key_colon(text: &str) -> bool {
    text.trim_end().ends_with(':')
}

/// Scans the full text tracking string/escape state to report whether the
/// text ends mid-string, and the number of currently-open `{` and `[`.
fn scan_nesting(text: &str) -> (bool, usize, usize) {
    let mut in_string = false;
    let mut escape = false;
    let mut brace_depth: i64 = 0;
    let mut bracket_depth: i64 = 0;

    for c in text.chars() {
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
            '{' => brace_depth += 1,
            '}' => brace_depth = (brace_depth - 1).max(0),
            '[' => bracket_depth += 1,
            ']' => bracket_depth = (bracket_depth - 1).max(0),
            _ => {}
        }
    }

    (
        in_string,
        usize::try_from(brace_depth.max(0)).unwrap_or(0),
        usize::try_from(bracket_depth.max(0)).unwrap_or(0),
    )
}

fn strip_trailing_commas_before_close(text: &str) -> String {
    let mut out = text.to_owned();
    loop {
        let trimmed_end = out.trim_end();
        if let Some(stripped) = trimmed_end.strip_suffix(',') {
            out = stripped.to_owned();
            continue;
        }
        break;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closes_unterminated_string_then_object() {
        let text = r#"{"a": 1, "b": "incomplete"#;
        let recovered = recover(text);
        let value: serde_json::Value = serde_json::from_str(&recovered).expect("recovers to valid json");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn closes_nested_array_and_object() {
        let text = r#"{"items": ["a", "b""#;
        let recovered = recover(text);
        assert!(serde_json::from_str::<serde_json::Value>(&recovered).is_ok());
    }

    #[test]
    fn drops_dangling_key_with_no_value() {
        let text = r#"{"a": 1, "b":"#;
        let recovered = recover(text);
        let value: serde_json::Value = serde_json::from_str(&recovered).expect("recovers to valid json");
        assert_eq!(value["a"], 1);
        assert!(value.get("b").is_none());
    }

    #[test]
    fn strips_trailing_comma_before_synthesized_closer() {
        let text = r#"{"a": 1,"#;
        let recovered = recover(text);
        assert_eq!(recovered, r#"{"a": 1}"#);
    }
}
