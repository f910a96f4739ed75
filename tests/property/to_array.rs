use proptest::prelude::*;
use rulekit::{RuleGroup, Validator};
use serde_json::{Value, json};

fn run(value: Value, rules: &str) -> Validator {
    let mut v = Validator::from_value(json!({ "f": value })).unwrap();
    v.run(&RuleGroup::new().with("f", rules)).unwrap();
    v
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Splitting drops blank pieces and keeps the rest in order.
    #[test]
    fn split_keeps_non_blank_pieces(pieces in prop::collection::vec("[a-z0-9 ]{0,6}", 1..8)) {
        let v = run(json!(pieces.join(",")), "to_array");
        let expected: Vec<Value> = pieces
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| json!(p))
            .collect();
        prop_assert_eq!(v.value("f"), Some(&Value::Array(expected)));
        prop_assert!(v.is_valid());
    }

    // A list passes through unchanged, however many times it is split.
    #[test]
    fn lists_are_left_alone(items in prop::collection::vec(any::<i64>(), 0..8)) {
        let list = json!(items);
        let v = run(list.clone(), "to_array|to_array:2|to_array:3");
        prop_assert_eq!(v.value("f"), Some(&list));
    }

    // Comma-joined whole numbers split and then pass item:number.
    #[test]
    fn numbers_split_then_validate(numbers in prop::collection::vec(0u32..1_000_000, 1..8)) {
        let joined = numbers.iter().map(u32::to_string).collect::<Vec<_>>().join(",");
        let v = run(json!(joined), "to_array|item:number");
        prop_assert!(v.is_valid());
        let expected: Vec<Value> = numbers.iter().map(|n| json!(n.to_string())).collect();
        prop_assert_eq!(v.value("f"), Some(&Value::Array(expected)));
    }
}
