use proptest::prelude::*;
use rulekit::value::{loose_cmp, loose_eq, size_of};
use rulekit::{RuleGroup, Validator};
use serde_json::json;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // A number equals its own decimal text.
    #[test]
    fn number_equals_its_text(n in any::<i64>()) {
        prop_assert!(loose_eq(&json!(n), &json!(n.to_string())));
    }

    // Numeric ordering agrees with i64 ordering, whatever the representation.
    #[test]
    fn ordering_matches_integers(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        prop_assert_eq!(loose_cmp(&json!(a), &json!(b.to_string())), Some(a.cmp(&b)));
    }

    // For non-numeric text, min/max compare the character count.
    #[test]
    fn min_max_use_char_count(text in "[a-zA-Z]{1,20}", bound in 0usize..25) {
        let len = text.chars().count();
        prop_assert_eq!(size_of(&json!(text)), Some(len as f64));

        let passes = |rule: String| {
            let mut v = Validator::from_value(json!({ "t": text.clone() })).unwrap();
            v.run(&RuleGroup::new().with("t", rule.as_str())).unwrap();
            v.is_valid()
        };
        prop_assert_eq!(passes(format!("min:{}", bound)), len >= bound);
        prop_assert_eq!(passes(format!("max:{}", bound)), len <= bound);
    }
}
