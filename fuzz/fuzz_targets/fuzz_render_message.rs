#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use rulekit::Arg;
use rulekit::message::MessageResolver;
use std::collections::HashMap;

#[derive(Debug, Arbitrary)]
struct Input {
    template: String,
    field: String,
    alias: Option<String>,
    args: Vec<String>,
}

fuzz_target!(|input: Input| {
    let mut aliases = HashMap::new();
    if let Some(alias) = input.alias {
        aliases.insert(input.field.clone(), alias);
    }
    let templates = HashMap::from([("r".to_string(), input.template)]);
    let messages = HashMap::new();
    let resolver = MessageResolver {
        aliases: &aliases,
        messages: &messages,
        templates: &templates,
    };
    let args: Vec<Arg> = input.args.iter().map(|a| Arg::from(a.as_str())).collect();
    let _ = resolver.render(&input.field, "r", &args);
});
