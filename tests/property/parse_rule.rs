use proptest::prelude::*;
use rulekit::parse::{parse_rule, parse_token, split_chain};
use rulekit::{Arg, RuleToken};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // name:a,b,c round-trips to the name and the coerced argument tokens.
    #[test]
    fn name_and_args_are_recovered(
        name in "[a-z][a-z_]{0,11}",
        args in prop::collection::vec("[a-zA-Z0-9 ]{0,8}", 1..5),
    ) {
        let spec = parse_rule(&format!("{}:{}", name, args.join(",")));
        prop_assert_eq!(spec.name, name);
        let expected: Vec<Arg> = args.iter().map(|a| Arg::from_token(a)).collect();
        prop_assert_eq!(spec.args, expected);
    }

    // Boolean literals are coerced regardless of case; nothing else is.
    #[test]
    fn only_boolean_literals_are_coerced(token in "[tTrRuUeEfFaAlLsS]{1,5}") {
        let expected = match token.to_ascii_lowercase().as_str() {
            "true" => Arg::Bool(true),
            "false" => Arg::Bool(false),
            _ => Arg::Str(token.clone()),
        };
        prop_assert_eq!(Arg::from_token(&token), expected);
    }

    // Splitting a pipe-joined chain yields the original tokens in order.
    #[test]
    fn pipe_chain_round_trips(names in prop::collection::vec("[a-z_]{1,10}(:[a-z0-9,]{0,6})?", 0..6)) {
        let tokens = split_chain(&names.join("|"));
        let expected: Vec<RuleToken> = names.iter().map(|n| RuleToken::from(n.as_str())).collect();
        prop_assert_eq!(tokens, expected);
    }

    // Parsing never panics and never yields a name containing ':'.
    #[test]
    fn parsing_is_total(token in "\\PC{0,40}") {
        let spec = parse_token(&RuleToken::Bare(token));
        prop_assert!(!spec.name.contains(':'));
    }
}
