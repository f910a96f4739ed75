use proptest::prelude::*;
use rulekit::{Arg, Validator};
use serde_json::{Value, json};

const SKIPPABLE: &[&str] = &[
    "email", "numeric", "min", "regex", "in", "date_format", "item", "gt_than", "no_such_rule",
];

fn blank() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), "[ \t\n]{0,6}".prop_map(Value::String)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // A blank value never fails a rule outside the must-run set, but the
    // attempt is still recorded.
    #[test]
    fn blank_values_skip_ordinary_rules(
        value in blank(),
        rule in prop::sample::select(SKIPPABLE),
    ) {
        let mut v = Validator::from_value(json!({ "f": value })).unwrap();
        prop_assert!(v.on_field("f", rule, &[]).is_ok());
        prop_assert!(v.is_valid());
        prop_assert!(v.field_rules("f").is_some_and(|r| r.contains_key(rule)));
        prop_assert_eq!(v.data().len(), 1);
    }

    // `required` is must-run: every blank value fails it.
    #[test]
    fn blank_values_fail_required(value in blank()) {
        let mut v = Validator::from_value(json!({ "f": value })).unwrap();
        v.on_field("f", "required", &[]).unwrap();
        prop_assert_eq!(v.errors().get("f").map(|m| m.len()), Some(1));
    }

    // `default` replaces every blank value and keeps every filled one.
    #[test]
    fn default_fills_only_blanks(
        value in prop_oneof![blank(), "[a-z]{1,8}".prop_map(Value::String)],
    ) {
        let was_blank = rulekit::value::is_blank(&value);
        let mut v = Validator::from_value(json!({ "f": value.clone() })).unwrap();
        v.on_field("f", "default", &[Arg::from("fallback")]).unwrap();
        let expected = if was_blank { json!("fallback") } else { value };
        prop_assert_eq!(v.value("f"), Some(&expected));
    }
}
