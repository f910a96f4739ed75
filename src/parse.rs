//! Rule-token parsing and rule-group decoding.

use crate::error::ParseError;
use crate::types::{Arg, RuleChain, RuleGroup, RuleSpec, RuleToken};
use serde_json::Value;

// ─── Rule tokens ────────────────────────────────────────────────────────────

/// Parse an unnamed rule token such as `"between:1,10"`.
///
/// The name runs up to the first `:`; the remainder is split on `,` and each
/// piece is coerced with [`Arg::from_token`]. A token without `:` has no
/// arguments. Never fails: resolving the name is the registry's job.
pub fn parse_rule(token: &str) -> RuleSpec {
    match token.split_once(':') {
        Some((name, rest)) => RuleSpec {
            name: name.trim().to_string(),
            args: rest.split(',').map(Arg::from_token).collect(),
        },
        None => RuleSpec {
            name: token.trim().to_string(),
            args: Vec::new(),
        },
    }
}

/// Parse a named rule token. The payload becomes the sole argument, unsplit.
pub fn parse_named(name: &str, payload: &Value) -> RuleSpec {
    RuleSpec {
        name: name.to_string(),
        args: vec![Arg::from(payload)],
    }
}

pub fn parse_token(token: &RuleToken) -> RuleSpec {
    match token {
        RuleToken::Bare(s) => parse_rule(s),
        RuleToken::Named { name, payload } => parse_named(name, payload),
    }
}

/// Split a pipe-delimited rule string. Empty segments are dropped.
pub fn split_chain(rules: &str) -> Vec<RuleToken> {
    rules
        .split('|')
        .filter(|segment| !segment.trim().is_empty())
        .map(RuleToken::from)
        .collect()
}

// ─── Rule groups ────────────────────────────────────────────────────────────

/// Decode a rule group from YAML or JSON text.
///
/// ```rust
/// let group = rulekit::parse::parse_rule_group(r#"
/// order_id: required|number
/// user_ids:
///   - to_array
///   - item:number
/// phone_no:
///   length_min: 10
/// "#).unwrap();
/// assert_eq!(group.len(), 3);
/// ```
pub fn parse_rule_group(input: &str) -> Result<RuleGroup, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::syntax("empty input"));
    }
    let value: Value =
        serde_saphyr::from_str(input).map_err(|e| ParseError::syntax(e.to_string()))?;
    rule_group_from_value(&value)
}

/// Decode a rule group from an already-parsed value.
///
/// The root must be a mapping of field name to one of:
/// - a pipe-delimited string,
/// - a sequence whose elements are rule strings or single-key mappings,
/// - a mapping of rule name to argument payload (each entry a named token).
pub fn rule_group_from_value(value: &Value) -> Result<RuleGroup, ParseError> {
    let fields = value
        .as_object()
        .ok_or_else(|| ParseError::type_mismatch("$", "rule group must be a mapping"))?;

    let mut group = RuleGroup::new();
    for (field, rules) in fields {
        group.insert(field.clone(), chain_from_value(field, rules)?);
    }
    Ok(group)
}

fn chain_from_value(field: &str, rules: &Value) -> Result<RuleChain, ParseError> {
    match rules {
        Value::String(s) => Ok(RuleChain::from(s.as_str())),
        Value::Array(items) => {
            let mut tokens = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                tokens.push(token_from_value(&format!("{}[{}]", field, i), item)?);
            }
            Ok(RuleChain(tokens))
        }
        Value::Object(map) => Ok(RuleChain(
            map.iter()
                .map(|(name, payload)| RuleToken::named(name.clone(), payload.clone()))
                .collect(),
        )),
        other => Err(ParseError::type_mismatch(
            field,
            format!("rules must be a string, sequence or mapping, got {}", other),
        )),
    }
}

fn token_from_value(path: &str, item: &Value) -> Result<RuleToken, ParseError> {
    match item {
        Value::String(s) => Ok(RuleToken::Bare(s.clone())),
        Value::Object(map) if map.len() == 1 => {
            let (name, payload) = map.iter().next().ok_or_else(|| {
                ParseError::type_mismatch(path, "named rule must have exactly one key")
            })?;
            Ok(RuleToken::named(name.clone(), payload.clone()))
        }
        Value::Object(map) => Err(ParseError::type_mismatch(
            path,
            format!("named rule must have exactly one key, found {}", map.len()),
        )),
        other => Err(ParseError::type_mismatch(
            path,
            format!("rule must be a string or single-key mapping, got {}", other),
        )),
    }
}
