#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    if let Ok(group) = rulekit::parse::parse_rule_group(&s) {
        for (_, chain) in group.iter() {
            for token in chain.iter() {
                let spec = rulekit::parse::parse_token(token);
                assert!(!matches!(token, rulekit::RuleToken::Bare(_)) || !spec.name.contains(':'));
            }
        }
    }
});
