//! Condition evaluation for [`Validator::when`](crate::Validator::when).

use crate::error::Result;
use crate::parse::parse_token;
use crate::registry::execute;
use crate::types::{Condition, RuleGroup};
use crate::validate::Validator;
use serde_json::Value;

/// Decide a condition against the validator's current bag.
///
/// A flag is returned as-is. A rule group holds when every rule of every
/// field passes; the first failing rule decides `false`. Rules run against a
/// scratch copy of the bag with no blank skipping, so mutators inside the
/// condition see each other's writes but the validator itself is untouched.
///
/// Configuration errors (unknown rule, bad argument) are still returned.
pub fn evaluate_condition(validator: &Validator, condition: &Condition) -> Result<bool> {
    match condition {
        Condition::Flag(flag) => Ok(*flag),
        Condition::Rules(group) => probe(validator, group),
    }
}

fn probe(validator: &Validator, group: &RuleGroup) -> Result<bool> {
    let mut scratch = validator.all_data().clone();
    for (field, chain) in group.iter() {
        for token in chain.iter() {
            let spec = parse_token(token);
            let value = scratch.get(field).cloned().unwrap_or(Value::Null);
            if !execute(
                validator.registry(),
                &mut scratch,
                field,
                &spec.name,
                &value,
                &spec.args,
            )? {
                tracing::trace!(field, rule = %spec.name, "condition rule failed");
                return Ok(false);
            }
        }
    }
    Ok(true)
}
