use rulekit::{Arg, Config, FailureMode, RuleGroup, Validator, ValidatorError};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn validator(data: Value) -> Validator {
    Validator::from_value(data).expect("data is a mapping")
}

fn run(data: Value, group: RuleGroup) -> Validator {
    let mut v = validator(data);
    v.run(&group).expect("well-formed rule group");
    v
}

// ─── End-to-end ─────────────────────────────────────────────────────────────

#[test]
fn order_scenario_passes_and_coerces() {
    let v = run(
        json!({"order_id": 123456789, "user_ids": "11,12,13"}),
        RuleGroup::new()
            .with("order_id", "required|number")
            .with("user_ids", "to_array|item:number"),
    );

    assert!(v.errors().is_empty());
    assert_eq!(
        Value::Object(v.data()),
        json!({"order_id": 123456789, "user_ids": ["11", "12", "13"]})
    );
}

#[test]
fn phone_scenario_collects_one_message() {
    let v = run(
        json!({"phone_no": "123"}),
        RuleGroup::new().with("phone_no", "length_min:10"),
    );

    let messages = v.errors().get("phone_no").expect("phone_no failed");
    assert_eq!(messages.len(), 1);
    assert_eq!(v.first_error(Some("phone_no")), Some(messages[0].as_str()));
    assert_eq!(v.first_error(Some("other_field")), None);
    assert!(!v.is_valid());
}

#[test]
fn errors_serialize_as_field_map() {
    let v = run(
        json!({"phone_no": "123"}),
        RuleGroup::new().with("phone_no", "length_min:10"),
    );
    assert_eq!(
        serde_json::to_value(v.errors()).unwrap(),
        json!({"phone_no": ["phone_no cannot pass the rule of length_min"]})
    );
}

// ─── Blank skip ─────────────────────────────────────────────────────────────

#[test]
fn blank_value_skips_ordinary_rules_but_is_recorded() {
    let mut v = validator(json!({"email": "   ", "nickname": null}));
    v.on_field("email", "email", &[]).unwrap();
    v.on_field("nickname", "alpha", &[]).unwrap();
    v.on_field("missing", "numeric", &[]).unwrap();

    assert!(v.is_valid());
    assert!(v.field_rules("email").unwrap().contains_key("email"));
    assert!(v.field_rules("missing").unwrap().contains_key("numeric"));
}

#[test]
fn blank_value_skips_unknown_rule() {
    let mut v = validator(json!({"a": ""}));
    assert!(v.on_field("a", "no_such_rule", &[]).is_ok());
}

#[test]
fn required_fires_on_blank() {
    let v = run(json!({"name": ""}), RuleGroup::new().with("name", "required"));
    assert_eq!(
        v.first_error(Some("name")),
        Some("name cannot pass the rule of required")
    );
}

#[test]
fn must_run_mutators_fill_blank_values() {
    let v = run(
        json!({"page": "", "size": null, "status": "", "tags": null}),
        RuleGroup::new()
            .with("page", "default:1")
            .with("size", "default:0")
            .with("status", "assign:null")
            .with("tags", "to_array"),
    );

    assert!(v.is_valid());
    assert_eq!(v.value("page"), Some(&json!("1")));
    assert_eq!(v.value("size"), Some(&json!(0)));
    assert_eq!(v.value("status"), Some(&Value::Null));
    assert_eq!(v.value("tags"), Some(&json!([])));
}

#[test]
fn default_leaves_filled_value_alone() {
    let v = run(json!({"page": "7"}), RuleGroup::new().with("page", "default:1"));
    assert_eq!(v.value("page"), Some(&json!("7")));
}

// ─── Mutation ordering ──────────────────────────────────────────────────────

#[test]
fn later_rules_see_rewritten_value() {
    let v = run(
        json!({"tags": "a,,b"}),
        RuleGroup::new().with("tags", "to_array|count_between:2,2"),
    );
    assert!(v.is_valid());
    assert_eq!(v.value("tags"), Some(&json!(["a", "b"])));
}

#[test]
fn assign_with_reads_mutated_source() {
    let v = run(
        json!({"source": "x;y", "copy": ""}),
        RuleGroup::new()
            .with("source", "to_array:2")
            .with("copy", "assign_with:source"),
    );
    assert_eq!(v.value("copy"), Some(&json!(["x", "y"])));
}

#[test]
fn item_fails_on_first_bad_element() {
    let v = run(
        json!({"ids": "1,x,3"}),
        RuleGroup::new().with("ids", "to_array|item:number"),
    );
    assert_eq!(
        v.first_error(Some("ids")),
        Some("ids cannot pass the rule of item")
    );
}

#[test]
fn failures_are_listed_in_execution_order() {
    let v = run(
        json!({"code": "ab", "zip": "x"}),
        RuleGroup::new()
            .with("zip", "numeric")
            .with("code", "numeric|length_min:5"),
    );

    let fields: Vec<&str> = v.errors().iter().map(|(f, _)| f).collect();
    assert_eq!(fields, ["zip", "code"]);
    assert_eq!(
        v.errors().get("code").unwrap(),
        [
            "code cannot pass the rule of numeric",
            "code cannot pass the rule of length_min"
        ]
    );
    assert_eq!(v.first_error(None), Some("zip cannot pass the rule of numeric"));
}

// ─── Data export ────────────────────────────────────────────────────────────

#[test]
fn data_is_restricted_to_validated_fields() {
    let v = run(
        json!({"a": 1, "b": 2, "c": 3}),
        RuleGroup::new().with("c", "numeric").with("a", "optional"),
    );

    assert_eq!(Value::Object(v.data()), json!({"a": 1, "c": 3}));
    assert_eq!(v.all_data().len(), 3);
}

#[test]
fn fields_created_by_mutators_show_up_in_all_data_only() {
    let config = Config::new();
    config.registry.register(
        "stamp",
        |_value, ctx, _args| {
            ctx.set_value("stamped", json!(true));
            true
        },
        false,
    );
    let mut v = Validator::with_config(json!({"a": 1}).as_object().unwrap().clone(), &config);
    v.run(&RuleGroup::new().with("a", "stamp")).unwrap();

    assert_eq!(v.all_data().get("stamped"), Some(&json!(true)));
    assert!(!v.data().contains_key("stamped"));
}

// ─── Failure modes ──────────────────────────────────────────────────────────

#[test]
fn throw_mode_stops_at_first_failure() {
    let mut v = validator(json!({"a": "x", "b": "y"}));
    v.throw_on_failure(true);
    let err = v
        .run(&RuleGroup::new().with("a", "numeric").with("b", "numeric"))
        .unwrap_err();

    match &err {
        ValidatorError::RuleFailure {
            field,
            rule,
            message,
        } => {
            assert_eq!(field, "a");
            assert_eq!(rule, "numeric");
            assert_eq!(err.to_string(), *message);
        }
        other => panic!("expected RuleFailure, got {:?}", other),
    }
    assert!(err.is_rule_failure());
    assert!(v.field_rules("b").is_none());
    assert!(v.errors().is_empty());
}

#[test]
fn collect_mode_keeps_going() {
    let mut v = validator(json!({"a": "x", "b": "y"}));
    v.failure_mode(FailureMode::Collect)
        .run(&RuleGroup::new().with("a", "numeric").with("b", "numeric"))
        .unwrap();
    assert_eq!(v.errors().len(), 2);
}

#[test]
fn unknown_rule_is_raised_in_collect_mode() {
    let mut v = validator(json!({"a": 1}));
    let err = v.on_field("a", "no_such_rule", &[]).unwrap_err();
    assert_eq!(
        err,
        ValidatorError::UnknownRule {
            rule: "no_such_rule".into()
        }
    );
    assert!(!err.is_rule_failure());
}

#[test]
fn bad_argument_is_raised() {
    let mut v = validator(json!({"a": "1,2"}));
    let err = v.on_field("a", "to_array", &[Arg::from("9")]).unwrap_err();
    assert!(matches!(err, ValidatorError::InvalidArgument { ref rule, .. } if rule == "to_array"));

    let err = v.on_field("a", "min", &[]).unwrap_err();
    assert!(matches!(err, ValidatorError::InvalidArgument { .. }));
}

// ─── Addressing modes ───────────────────────────────────────────────────────

#[test]
fn on_rule_broadcasts_to_every_field() {
    let mut v = validator(json!({"a": 1, "b": "", "c": "x"}));
    v.on_rule("required", &["a", "b", "c"], &[]).unwrap();

    assert_eq!(v.errors().len(), 1);
    assert!(v.errors().contains("b"));
    assert_eq!(v.fields().len(), 3);
}

#[test]
fn field_record_keeps_arguments() {
    let v = run(
        json!({"n": 5}),
        RuleGroup::new().with("n", "between:1,10|in:true,x"),
    );
    let rules = v.field_rules("n").unwrap();
    assert_eq!(rules["between"], vec![Arg::from("1"), Arg::from("10")]);
    assert_eq!(rules["in"], vec![Arg::Bool(true), Arg::from("x")]);
}

#[test]
fn make_then_handle_runs_stored_group() {
    let group = RuleGroup::new().with("age", "required|integer");
    let mut messages = HashMap::new();
    messages.insert("age.integer".to_string(), "age must be whole".to_string());

    let mut v = Validator::make(
        json!({"age": "4.5"}).as_object().unwrap().clone(),
        group,
        messages,
        HashMap::new(),
    );
    v.handle().unwrap();
    assert_eq!(v.first_error(Some("age")), Some("age must be whole"));

    // The stored group survives and can run again.
    v.set_value("age", "4").handle().unwrap();
    assert_eq!(v.errors().get("age").unwrap().len(), 1);
}

#[test]
fn make_with_config_seeds_then_overrides() {
    let config = Config::new()
        .with_aliases([("age", "Age"), ("name", "Name")])
        .with_messages([("name.required", "Name please")])
        .with_templates([("odd", "{field} must be odd")]);
    config
        .registry
        .register("odd", |value, _, _| value.as_i64().is_some_and(|n| n % 2 == 1), false);

    let mut aliases = HashMap::new();
    aliases.insert("age".to_string(), "Your age".to_string());
    let mut v = Validator::make_with_config(
        json!({"age": 4, "name": ""}).as_object().unwrap().clone(),
        RuleGroup::new().with("age", "odd").with("name", "required"),
        HashMap::new(),
        aliases,
        &config,
    );
    v.handle().unwrap();

    assert_eq!(v.first_error(Some("age")), Some("Your age must be odd"));
    assert_eq!(v.first_error(Some("name")), Some("Name please"));
}

// ─── Registry ───────────────────────────────────────────────────────────────

#[test]
fn registered_rule_receives_args_and_context() {
    let config = Config::new();
    config.registry.register(
        "foo",
        |value, ctx, args| {
            ctx.field() == "name" && value == "Jam" && args == [Arg::from("bar")]
        },
        false,
    );
    let v = rulekit::check(
        json!({"name": "Jam"}),
        &RuleGroup::new().with("name", "foo:bar"),
        &config,
    )
    .unwrap();
    assert!(v.is_valid());
}

#[test]
fn registered_rule_overrides_builtin() {
    let config = Config::new();
    config
        .registry
        .register("numeric", |value, _ctx, _args| value == "forty-two", false);

    let v = rulekit::check(
        json!({"n": "forty-two"}),
        &RuleGroup::new().with("n", "numeric"),
        &config,
    )
    .unwrap();
    assert!(v.is_valid());
}

#[test]
fn registered_rule_skips_blank_unless_must_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = Config::new();

    let counter = Arc::clone(&calls);
    config.registry.register(
        "counted",
        move |_value, _ctx, _args| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        },
        false,
    );
    config.registry.register(
        "fill",
        |_value, ctx, _args| {
            ctx.replace(json!("filled"));
            true
        },
        true,
    );

    let v = rulekit::check(
        json!({"a": "", "b": null}),
        &RuleGroup::new().with("a", "counted").with("b", "fill"),
        &config,
    )
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(v.value("b"), Some(&json!("filled")));
    assert!(config.registry.is_must_run("fill"));
    assert!(!config.registry.is_must_run("counted"));
}

#[test]
fn registration_is_visible_to_existing_validators() {
    let config = Config::new();
    let mut v = Validator::with_config(json!({"a": 1}).as_object().unwrap().clone(), &config);

    config.registry.register("late", |_, _, _| false, false);
    v.run(&RuleGroup::new().with("a", "late")).unwrap();

    assert_eq!(v.first_error(Some("a")), Some("a cannot pass the rule of late"));
}

#[test]
fn reregistration_replaces_handler_and_flag() {
    let config = Config::new();
    config.registry.register("r", |_, _, _| false, true);
    config.registry.register("r", |_, _, _| true, false);

    assert!(config.registry.is_registered("r"));
    assert!(!config.registry.is_must_run("r"));

    let v = rulekit::check(json!({"a": 1}), &RuleGroup::new().with("a", "r"), &config).unwrap();
    assert!(v.is_valid());
}

#[test]
fn registered_rule_can_dispatch_builtins() {
    let config = Config::new();
    config.registry.register(
        "numeric_or_dash",
        |value, ctx, _args| value == "-" || ctx.dispatch("numeric", value, &[]).unwrap_or(false),
        false,
    );

    let v = rulekit::check(
        json!({"a": "-", "b": "12", "c": "x"}),
        &RuleGroup::new()
            .with("a", "numeric_or_dash")
            .with("b", "numeric_or_dash")
            .with("c", "numeric_or_dash"),
        &config,
    )
    .unwrap();

    assert_eq!(v.errors().len(), 1);
    assert!(v.errors().contains("c"));
}
