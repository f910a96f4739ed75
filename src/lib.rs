//! Declarative validation and coercion of field bags.
//!
//! Rules are data: each field of a bag gets an ordered chain of rule tokens
//! such as `"required|number"` or `["to_array", "item:number"]`. Rules run left
//! to right and may rewrite the value they check, so a later rule sees what an
//! earlier one produced.
//!
//! ```text
//! parse_rule_group(yaml) → RuleGroup ─┐
//!                                     ├→ Validator::run → errors() / data()
//! Config (aliases, templates, rules) ─┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use rulekit::{Config, parse::parse_rule_group};
//! use serde_json::json;
//!
//! let rules = parse_rule_group(r#"
//! phone_no: length_min:10
//! start_date: required|date
//! "#).expect("valid rule group");
//!
//! let config = Config::new()
//!     .with_aliases([("phone_no", "Phone number")])
//!     .with_templates([("length_min", "{field} needs at least {0} characters")]);
//!
//! let data = json!({"phone_no": "123", "start_date": "2024-03-01"});
//! let v = rulekit::check(data, &rules, &config).expect("well-formed rules");
//!
//! assert_eq!(
//!     v.first_error(Some("phone_no")),
//!     Some("Phone number needs at least 10 characters"),
//! );
//! ```
//!
//! # Extending
//!
//! Rules registered on a [`Registry`] take precedence over built-ins of the
//! same name. The registry is a shared handle; register before validating.
//!
//! ```rust
//! use rulekit::{Config, RuleGroup};
//! use serde_json::json;
//!
//! let config = Config::new();
//! config.registry.register("even", |value, _ctx, _args| {
//!     value.as_i64().is_some_and(|n| n % 2 == 0)
//! }, false);
//!
//! let v = rulekit::check(json!({"n": 3}), &RuleGroup::new().with("n", "even"), &config).unwrap();
//! assert_eq!(v.first_error(None), Some("n cannot pass the rule of even"));
//! ```

pub mod config;
pub mod error;
pub mod evaluate;
pub mod message;
pub mod parse;
pub mod registry;
pub mod types;
pub mod validate;
pub mod value;

pub(crate) mod mutators;
pub(crate) mod rules;

pub use config::Config;
pub use error::*;
pub use registry::{Registry, RuleContext};
pub use types::*;
pub use validate::Validator;

// Re-export leaf helpers that are useful outside rule handlers.
pub use rules::{compile_pattern, parse_timestamp, translate_date_format};

/// Convenience entry point: build a validator from `config`, run `rules`
/// against `data`, and hand back the validator for inspection.
///
/// `data` must be a JSON object. In [`FailureMode::Throw`] the first failing
/// rule is returned as [`ValidatorError::RuleFailure`].
pub fn check(data: serde_json::Value, rules: &RuleGroup, config: &Config) -> Result<Validator> {
    let mut validator = Validator::with_config(validate::bag_from_value(data)?, config);
    validator.run(rules)?;
    Ok(validator)
}
