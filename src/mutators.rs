//! Built-ins that rewrite the value under validation.
//!
//! Each mutator writes through [`RuleContext`]; the engine reads the field
//! again before the next rule, so later rules see the new value.

use crate::error::Result;
use crate::registry::RuleContext;
use crate::types::Arg;
use crate::value::{is_blank, is_truthy, scalar_text, value_to_string};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static BARE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Always passes. Marks a field as in scope without constraining it.
pub(crate) fn optional(_ctx: &mut RuleContext<'_>, _value: &Value, _args: &[Arg]) -> Result<bool> {
    Ok(true)
}

/// Decode a JSON string in place. Lists and maps are already decoded.
pub(crate) fn json(ctx: &mut RuleContext<'_>, value: &Value, _args: &[Arg]) -> Result<bool> {
    match value {
        Value::Array(_) | Value::Object(_) => Ok(is_truthy(value)),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(decoded) if is_truthy(&decoded) => {
                ctx.replace(decoded);
                Ok(true)
            }
            _ => Ok(false),
        },
        _ => Ok(false),
    }
}

/// Separator selected by a `to_array` code.
fn separator(ctx: &RuleContext<'_>, args: &[Arg]) -> Result<char> {
    let code = match args.first() {
        None => return Ok(','),
        Some(arg) => arg.text().unwrap_or_default(),
    };
    match code.trim() {
        "" | "1" => Ok(','),
        "2" => Ok(';'),
        "3" => Ok('|'),
        other => Err(ctx.invalid(format!(
            "separator code must be 1 (','), 2 (';') or 3 ('|'), got '{}'",
            other
        ))),
    }
}

/// Split a delimited string into a list, dropping blank pieces.
///
/// A list passes through untouched; a blank value becomes an empty list.
pub(crate) fn to_array(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let sep = separator(ctx, args)?;
    if value.is_array() {
        return Ok(true);
    }
    let items: Vec<Value> = match value {
        Value::Object(map) => map.values().cloned().collect(),
        _ if is_blank(value) => Vec::new(),
        other => value_to_string(other)
            .split(sep)
            .filter(|piece| !piece.trim().is_empty())
            .map(|piece| Value::String(piece.to_string()))
            .collect(),
    };
    ctx.replace(Value::Array(items));
    Ok(true)
}

/// `item:<rule>[,args...]`: run `rule` against every element, failing on the
/// first element that fails. Only lists and maps can pass.
///
/// A mutating `rule` rewrites elements in place; the rebuilt list (or map) is
/// written back once the elements have run.
pub(crate) fn item(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    let rule = ctx.text_arg(args, 0)?;
    let rest = &args[1..];
    let mut rebuilt = value.clone();
    let elements: Vec<&mut Value> = match &mut rebuilt {
        Value::Array(items) => items.iter_mut().collect(),
        Value::Object(map) => map.values_mut().collect(),
        _ => return Ok(false),
    };
    let mut passed = true;
    for element in elements {
        if !ctx.dispatch_element(&rule, element, rest)? {
            passed = false;
            break;
        }
    }
    if rebuilt != *value {
        ctx.replace(rebuilt);
    }
    Ok(passed)
}

/// `"0"` and `"null"` stand for the number zero and null; a missing argument
/// is the empty string. Anything else is kept as written.
fn literal(args: &[Arg]) -> Value {
    match args.first() {
        None => Value::String(String::new()),
        Some(Arg::Str(s)) if s == "0" => Value::from(0),
        Some(Arg::Str(s)) if s == "null" => Value::Null,
        Some(arg) => arg.to_value(),
    }
}

/// Fill a blank field with the argument.
pub(crate) fn default(ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
    if is_blank(value) {
        ctx.replace(literal(args));
    }
    Ok(true)
}

/// Overwrite the field with the argument.
pub(crate) fn assign(ctx: &mut RuleContext<'_>, _value: &Value, args: &[Arg]) -> Result<bool> {
    ctx.replace(literal(args));
    Ok(true)
}

/// Overwrite the field with the current value of another field.
pub(crate) fn assign_with(ctx: &mut RuleContext<'_>, _value: &Value, args: &[Arg]) -> Result<bool> {
    let other = ctx.text_arg(args, 0)?;
    let copied = ctx.value(&other).cloned().unwrap_or(Value::Null);
    ctx.replace(copied);
    Ok(true)
}

fn append_time(ctx: &mut RuleContext<'_>, value: &Value, time: &str) -> Result<bool> {
    if let Some(text) = scalar_text(value)
        && BARE_DATE_RE.is_match(&text)
    {
        ctx.replace(Value::String(format!("{} {}", text, time)));
    }
    Ok(true)
}

/// `2024-03-01` → `2024-03-01 00:00:00`; anything else is left alone.
pub(crate) fn to_date_time_start(
    ctx: &mut RuleContext<'_>,
    value: &Value,
    _args: &[Arg],
) -> Result<bool> {
    append_time(ctx, value, "00:00:00")
}

/// `2024-03-01` → `2024-03-01 23:59:59`; anything else is left alone.
pub(crate) fn to_date_time_end(
    ctx: &mut RuleContext<'_>,
    value: &Value,
    _args: &[Arg],
) -> Result<bool> {
    append_time(ctx, value, "23:59:59")
}
