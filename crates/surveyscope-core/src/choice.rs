//! Decoding of stored choice-label and choice-score fields.
//!
//! A field may arrive as a native array, a JSON-encoded array string, or the
//! brace-delimited text form `{"A","B",C}`. Every entry point returns a clean
//! ordered sequence and never fails; anything unrecognised decodes to empty.

use std::borrow::Cow;

use serde_json::Value;

enum RawChoices<'a> {
    Values(Cow<'a, [Value]>),
    Tokens(Vec<String>),
}

pub fn parse_choice_labels(raw: &Value) -> Vec<String> {
    match decode(raw) {
        Some(RawChoices::Values(values)) => values.iter().map(label_from_value).collect(),
        Some(RawChoices::Tokens(tokens)) => tokens,
        None => Vec::new(),
    }
}

/// Elements that do not coerce to a finite number are dropped. Null and blank
/// entries coerce to 0 so that a hole in the stored array keeps later scores
/// aligned with their labels.
pub fn parse_choice_scores(raw: &Value) -> Vec<f64> {
    match decode(raw) {
        Some(RawChoices::Values(values)) => values.iter().filter_map(number_from_value).collect(),
        Some(RawChoices::Tokens(tokens)) => tokens
            .iter()
            .filter_map(|token| number_from_text(token))
            .collect(),
        None => Vec::new(),
    }
}

fn decode(raw: &Value) -> Option<RawChoices<'_>> {
    match raw {
        Value::Array(items) => Some(RawChoices::Values(Cow::Borrowed(items.as_slice()))),
        Value::String(text) => {
            let decoded = decode_text(text);
            if decoded.is_none() && !text.trim().is_empty() {
                tracing::debug!(field = %text, "unrecognised choice field, treating as empty");
            }
            decoded
        }
        _ => None,
    }
}

fn decode_text(text: &str) -> Option<RawChoices<'static>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Some(RawChoices::Values(Cow::Owned(items)));
    }
    split_braced(trimmed).map(RawChoices::Tokens)
}

/// Splits `{a,"b, c",d}` on commas outside double quotes. Quote characters
/// are dropped, `\"` and `\\` inside quotes are unescaped, and each element
/// is trimmed.
fn split_braced(text: &str) -> Option<Vec<String>> {
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    tokens.push(current.trim().to_string());
    Some(tokens)
}

fn label_from_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => number_from_text(s),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null => Some(0.0),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_from_text(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn braced_and_json_forms_agree() {
        let braced = parse_choice_labels(&json!(r#"{"Definitely","Kind of","Not really"}"#));
        let encoded = parse_choice_labels(&json!(r#"["Definitely","Kind of","Not really"]"#));
        let native = parse_choice_labels(&json!(["Definitely", "Kind of", "Not really"]));
        assert_eq!(braced, vec!["Definitely", "Kind of", "Not really"]);
        assert_eq!(braced, encoded);
        assert_eq!(braced, native);
    }

    #[test]
    fn braced_form_respects_quotes_and_escapes() {
        let labels = parse_choice_labels(&json!(r#"{ Yes , "No, never", "Say \"maybe\"" }"#));
        assert_eq!(labels, vec!["Yes", "No, never", "Say \"maybe\""]);
        assert!(parse_choice_labels(&json!("{}")).is_empty());
    }

    #[test]
    fn labels_coerce_non_string_elements() {
        let labels = parse_choice_labels(&json!([1, "two", true]));
        assert_eq!(labels, vec!["1", "two", "true"]);
    }

    #[test]
    fn scores_parse_every_encoding() {
        assert_eq!(parse_choice_scores(&json!([0, 1.5, "2"])), vec![0.0, 1.5, 2.0]);
        assert_eq!(parse_choice_scores(&json!("[3, 4]")), vec![3.0, 4.0]);
        assert_eq!(parse_choice_scores(&json!("{1,\"2\", 5}")), vec![1.0, 2.0, 5.0]);
    }

    #[test]
    fn scores_drop_non_numeric_elements() {
        assert_eq!(parse_choice_scores(&json!(["1", "x", "NaN", 3])), vec![1.0, 3.0]);
        assert_eq!(parse_choice_scores(&json!([null, " "])), vec![0.0, 0.0]);
    }

    #[test]
    fn unparseable_input_is_empty() {
        assert!(parse_choice_labels(&Value::Null).is_empty());
        assert!(parse_choice_labels(&json!("")).is_empty());
        assert!(parse_choice_labels(&json!("just text")).is_empty());
        assert!(parse_choice_labels(&json!("{\"open")).is_empty());
        assert!(parse_choice_labels(&json!({"a": 1})).is_empty());
        assert!(parse_choice_scores(&json!(7)).is_empty());
        assert!(parse_choice_scores(&json!("\"5\"")).is_empty());
    }
}
