#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use rulekit::{Config, FailureMode, RuleGroup, Validator};
use serde_json::{Map, Value};

const FIELDS: &[&str] = &["a", "b", "c"];

/// Generate a small JSON value from fuzzer bytes.
fn arbitrary_value(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Value> {
    let upper = if depth == 0 { 3 } else { 5 };
    match u.int_in_range(0..=upper)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(bool::arbitrary(u)?)),
        2 => Ok(Value::from(i64::arbitrary(u)?)),
        3 => Ok(Value::String(String::arbitrary(u)?)),
        4 => {
            let len = u.int_in_range(0..=4)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(arbitrary_value(u, depth - 1)?);
            }
            Ok(Value::Array(items))
        }
        _ => {
            let len = u.int_in_range(0..=4)?;
            let mut map = Map::new();
            for _ in 0..len {
                map.insert(String::arbitrary(u)?, arbitrary_value(u, depth - 1)?);
            }
            Ok(Value::Object(map))
        }
    }
}

fn run(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
    let mut data = Map::new();
    for field in FIELDS {
        if bool::arbitrary(u)? {
            data.insert(field.to_string(), arbitrary_value(u, 2)?);
        }
    }

    let mut group = RuleGroup::new();
    for field in FIELDS {
        let rules = String::arbitrary(u)?;
        group.insert(*field, rules.as_str());
    }

    let mode = if bool::arbitrary(u)? {
        FailureMode::Throw
    } else {
        FailureMode::Collect
    };
    let config = Config::new()
        .with_failure_mode(mode)
        .with_templates([("min", "{field} {0} {args} {other}")]);

    let mut v = Validator::with_config(data, &config);
    if v.run(&group).is_ok() && mode == FailureMode::Collect {
        // Every collected field had a rule attempted.
        for (field, _) in v.errors().iter() {
            assert!(v.field_rules(field).is_some());
        }
        assert!(v.data().keys().all(|k| v.fields().contains_key(k)));
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let _ = run(&mut Unstructured::new(data));
});
