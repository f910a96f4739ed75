//! The validation engine.
//!
//! A [`Validator`] owns one data bag and runs rules against its fields, either
//! one at a time ([`Validator::on_field`], [`Validator::on_rule`]) or a whole
//! [`RuleGroup`] at once ([`Validator::run`]). Rules may rewrite field values;
//! every later rule reads the rewritten value.

use crate::config::{self, Config};
use crate::error::{ParseError, Result, ValidatorError};
use crate::evaluate::evaluate_condition;
use crate::message::MessageResolver;
use crate::parse::parse_token;
use crate::registry::{Registry, execute};
use crate::types::*;
use crate::value::is_blank;
use serde_json::Value;
use std::collections::HashMap;

/// Validates and coerces a bag of named values.
///
/// ```rust
/// use rulekit::{RuleGroup, Validator};
/// use serde_json::json;
///
/// let mut v = Validator::from_value(json!({"order_id": 123456789, "user_ids": "11,12,13"})).unwrap();
/// v.run(&RuleGroup::new()
///     .with("order_id", "required|number")
///     .with("user_ids", "to_array|item:number"))
///     .unwrap();
///
/// assert!(v.is_valid());
/// assert_eq!(v.value("user_ids"), Some(&json!(["11", "12", "13"])));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Validator {
    data: DataBag,
    fields: FieldRecord,
    errors: Errors,
    group: RuleGroup,
    aliases: HashMap<String, String>,
    messages: HashMap<String, String>,
    templates: HashMap<String, String>,
    failure_mode: FailureMode,
    registry: Registry,
}

impl Validator {
    /// A validator over `data` with an empty configuration.
    pub fn new(data: DataBag) -> Self {
        Validator {
            data,
            ..Validator::default()
        }
    }

    /// A validator over `data`, seeded with copies of the config's tables.
    pub fn with_config(data: DataBag, config: &Config) -> Self {
        Validator {
            data,
            aliases: config.aliases.clone(),
            messages: config.messages.clone(),
            templates: config.templates.clone(),
            failure_mode: config.failure_mode,
            registry: config.registry.clone(),
            ..Validator::default()
        }
    }

    /// A validator over a JSON object.
    pub fn from_value(data: Value) -> Result<Self> {
        Ok(Validator::new(bag_from_value(data)?))
    }

    /// Data, a stored rule group, per-field messages and aliases in one call.
    /// Run the stored group with [`Validator::handle`].
    pub fn make<M, A>(data: DataBag, rules: RuleGroup, messages: M, aliases: A) -> Self
    where
        M: IntoIterator<Item = (String, String)>,
        A: IntoIterator<Item = (String, String)>,
    {
        Validator::make_with_config(data, rules, messages, aliases, &Config::default())
    }

    /// [`Validator::make`] seeded from `config` first; `messages` and
    /// `aliases` then override entries of the same key.
    pub fn make_with_config<M, A>(
        data: DataBag,
        rules: RuleGroup,
        messages: M,
        aliases: A,
        config: &Config,
    ) -> Self
    where
        M: IntoIterator<Item = (String, String)>,
        A: IntoIterator<Item = (String, String)>,
    {
        let mut v = Validator::with_config(data, config);
        v.rules(rules).messages(messages).alias(aliases);
        v
    }

    // ─── Configuration ──────────────────────────────────────────────────────

    pub fn failure_mode(&mut self, mode: FailureMode) -> &mut Self {
        self.failure_mode = mode;
        self
    }

    /// Shorthand for [`FailureMode::Throw`] / [`FailureMode::Collect`].
    pub fn throw_on_failure(&mut self, throw: bool) -> &mut Self {
        self.failure_mode(if throw {
            FailureMode::Throw
        } else {
            FailureMode::Collect
        })
    }

    /// Add or replace field labels for this validator only.
    pub fn alias<I, K, V>(&mut self, aliases: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        config::extend(&mut self.aliases, aliases);
        self
    }

    /// Add or replace `field.rule` / `field` messages for this validator only.
    pub fn messages<I, K, V>(&mut self, messages: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        config::extend(&mut self.messages, messages);
        self
    }

    /// Add or replace rule templates for this validator only.
    pub fn message_templates<I, K, V>(&mut self, templates: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        config::extend(&mut self.templates, templates);
        self
    }

    /// Store a rule group for a later [`Validator::handle`].
    pub fn rules(&mut self, group: RuleGroup) -> &mut Self {
        self.group = group;
        self
    }

    // ─── Execution ──────────────────────────────────────────────────────────

    /// Run the stored rule group.
    pub fn handle(&mut self) -> Result<&mut Self> {
        let group = std::mem::take(&mut self.group);
        let outcome = self.run_group(&group);
        self.group = group;
        outcome.map(|()| self)
    }

    /// Run every rule of `group`: fields in group order, rules left to right.
    pub fn run(&mut self, group: &RuleGroup) -> Result<&mut Self> {
        self.run_group(group)?;
        Ok(self)
    }

    fn run_group(&mut self, group: &RuleGroup) -> Result<()> {
        for (field, chain) in group.iter() {
            for token in chain.iter() {
                let spec = parse_token(token);
                self.on_field(field, &spec.name, &spec.args)?;
            }
        }
        Ok(())
    }

    /// Run one rule against several fields.
    pub fn on_rule<S: AsRef<str>>(
        &mut self,
        rule: &str,
        fields: &[S],
        args: &[Arg],
    ) -> Result<&mut Self> {
        for field in fields {
            self.on_field(field.as_ref(), rule, args)?;
        }
        Ok(self)
    }

    /// Run one rule against one field.
    ///
    /// The attempt is recorded even when the rule is skipped. A blank value
    /// skips every rule that is not must-run. On failure the rendered message
    /// is collected, or returned as [`ValidatorError::RuleFailure`] in
    /// throw mode.
    pub fn on_field(&mut self, field: &str, rule: &str, args: &[Arg]) -> Result<&mut Self> {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(rule.to_string(), args.to_vec());

        let value = self.data.get(field).cloned().unwrap_or(Value::Null);
        if is_blank(&value) && !self.registry.is_must_run(rule) {
            tracing::trace!(field, rule, "blank value, rule skipped");
            return Ok(self);
        }

        if execute(&self.registry, &mut self.data, field, rule, &value, args)? {
            tracing::trace!(field, rule, "rule passed");
            return Ok(self);
        }

        let message = self.resolver().render(field, rule, args)?;
        tracing::debug!(field, rule, %message, "rule failed");
        match self.failure_mode {
            FailureMode::Throw => Err(ValidatorError::RuleFailure {
                field: field.to_string(),
                rule: rule.to_string(),
                message,
            }),
            FailureMode::Collect => {
                self.errors.push(field, message);
                Ok(self)
            }
        }
    }

    /// Run `then` if `condition` holds.
    ///
    /// A rule-group condition is probed against a copy of the bag: nothing it
    /// does is recorded, collected or written back.
    pub fn when<F>(&mut self, condition: impl Into<Condition>, then: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut Validator) -> Result<()>,
    {
        self.when_else(condition, then, |_| Ok(()))
    }

    /// Run `then` if `condition` holds, `otherwise` if it does not.
    pub fn when_else<F, G>(
        &mut self,
        condition: impl Into<Condition>,
        then: F,
        otherwise: G,
    ) -> Result<&mut Self>
    where
        F: FnOnce(&mut Validator) -> Result<()>,
        G: FnOnce(&mut Validator) -> Result<()>,
    {
        let holds = evaluate_condition(self, &condition.into())?;
        tracing::debug!(holds, "condition evaluated");
        if holds {
            then(self)?;
        } else {
            otherwise(self)?;
        }
        Ok(self)
    }

    fn resolver(&self) -> MessageResolver<'_> {
        MessageResolver {
            aliases: &self.aliases,
            messages: &self.messages,
            templates: &self.templates,
        }
    }

    // ─── Data ───────────────────────────────────────────────────────────────

    pub fn value(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set_value(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// Fields that had at least one rule attempted, in bag order.
    pub fn data(&self) -> DataBag {
        self.data
            .iter()
            .filter(|(field, _)| self.fields.contains_key(*field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// The whole bag, including fields no rule touched.
    pub fn all_data(&self) -> &DataBag {
        &self.data
    }

    // ─── Results ────────────────────────────────────────────────────────────

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    /// First message for `field`, or of the first failing field when `None`.
    pub fn first_error(&self, field: Option<&str>) -> Option<&str> {
        self.errors.first(field)
    }

    /// True when no failure has been collected.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Rules attempted on `field`, with their arguments.
    pub fn field_rules(&self, field: &str) -> Option<&FieldRules> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &FieldRecord {
        &self.fields
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

pub(crate) fn bag_from_value(data: Value) -> Result<DataBag> {
    match data {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::type_mismatch(
            "$",
            format!("data must be a mapping, got {}", other),
        )
        .into()),
    }
}
