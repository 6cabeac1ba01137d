//! Shared utility functions.

use serde_json::Value;

/// Truncate to at most `max_chars` characters, marking the cut with `…`
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…", &s[..cut]),
    }
}

/// One-line preview of a JSON value
pub fn preview(value: &Value, max_chars: usize) -> String {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    truncate_chars(&text.replace('\n', " "), max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_no_op_when_short() {
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("あのね", 2), "あの…");
        assert_eq!(truncate_chars("あのね", 3), "あのね");
    }

    #[test]
    fn preview_flattens_values() {
        assert_eq!(preview(&json!("line one\nline two"), 40), "line one line two");
        assert_eq!(preview(&json!({"a": 1}), 40), "{\"a\":1}");
        assert_eq!(preview(&json!([1, 2, 3, 4]), 4), "[1,2…");
    }
}
