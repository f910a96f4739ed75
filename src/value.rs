//! Value views shared by the engine and the rule catalog.
//!
//! Rules receive raw JSON values; these helpers give them a consistent notion
//! of blankness, text, number and size.

use serde_json::Value;
use std::cmp::Ordering;

// ─── Blankness ──────────────────────────────────────────────────────────────

/// Null, or a string that is empty after trimming.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Absent fields read as null.
pub fn is_blank_opt(value: Option<&Value>) -> bool {
    value.is_none_or(is_blank)
}

// ─── Text / number views ────────────────────────────────────────────────────

/// Text view of a scalar. Strings as-is, numbers in their JSON form.
/// Booleans, null, arrays and objects have no text view.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Render any value for interpolation into a message or a bag string.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Parse a decimal number written as text: optional surrounding whitespace,
/// optional sign, digits with an optional fraction and exponent.
/// `inf`, `NaN` and hex literals are rejected.
pub fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !digits
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Numeric view: numbers, and strings that read as numbers.
pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_numeric(s),
        _ => None,
    }
}

// ─── Size ───────────────────────────────────────────────────────────────────

/// Size used by `min`/`max`/`between`: numeric value for numbers and numeric
/// strings, character count for other strings, element count for collections.
pub fn size_of(value: &Value) -> Option<f64> {
    if let Some(n) = numeric(value) {
        return Some(n);
    }
    match value {
        Value::String(s) => Some(s.chars().count() as f64),
        Value::Array(items) => Some(items.len() as f64),
        Value::Object(map) => Some(map.len() as f64),
        _ => None,
    }
}

/// Character count of a scalar's text view.
pub fn char_len(value: &Value) -> Option<usize> {
    scalar_text(value).map(|s| s.chars().count())
}

/// Element count of an array or object.
pub fn element_count(value: &Value) -> Option<usize> {
    match value {
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

// ─── Loose comparison ───────────────────────────────────────────────────────

/// Equality across representations: `"12" == 12`, `12 == 12.0`.
///
/// Numbers compare numerically, then scalars by text, then everything else
/// structurally.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return x == y;
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| loose_eq(v, other)))
        }
        _ => match (scalar_text(a), scalar_text(b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

/// Ordering across representations. Numeric when both sides are numeric,
/// otherwise by text. `None` when the pair is not comparable.
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (numeric(a), numeric(b)) {
        return x.partial_cmp(&y);
    }
    match (scalar_text(a), scalar_text(b)) {
        (Some(x), Some(y)) => Some(x.cmp(&y)),
        _ => None,
    }
}

/// Loose membership test.
pub fn contains_loose(haystack: &[Value], needle: &Value) -> bool {
    haystack.iter().any(|item| loose_eq(item, needle))
}

/// Truthiness used by `json` to decide whether a decode produced
/// anything.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
