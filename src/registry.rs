//! Rule resolution: the built-in table, externally registered rules, and the
//! context handed to every handler.

use crate::error::{Result, ValidatorError};
use crate::mutators;
use crate::rules;
use crate::types::{Arg, DataBag};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Signature of a built-in rule.
pub type BuiltinFn = fn(&mut RuleContext<'_>, &Value, &[Arg]) -> Result<bool>;

/// Signature of an externally registered rule: `(value, context, args)`.
pub type ExternalFn = dyn Fn(&Value, &mut RuleContext<'_>, &[Arg]) -> bool + Send + Sync;

// ─── Built-in table ─────────────────────────────────────────────────────────

/// An entry in the built-in rule table.
#[derive(Clone, Copy)]
pub struct BuiltinRule {
    pub name: &'static str,
    /// Runs even when the field is blank.
    pub must_run: bool,
    pub handler: BuiltinFn,
}

impl fmt::Debug for BuiltinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinRule")
            .field("name", &self.name)
            .field("must_run", &self.must_run)
            .finish()
    }
}

const fn rule(name: &'static str, handler: BuiltinFn) -> BuiltinRule {
    BuiltinRule {
        name,
        must_run: false,
        handler,
    }
}

const fn must(name: &'static str, handler: BuiltinFn) -> BuiltinRule {
    BuiltinRule {
        name,
        must_run: true,
        handler,
    }
}

/// Every rule shipped with the crate.
pub static BUILTIN_RULES: &[BuiltinRule] = &[
    // Presence
    must("required", rules::required),
    must("required_with", rules::required_with),
    must("required_without", rules::required_without),
    rule("optional", mutators::optional),
    rule("accepted", rules::accepted),
    rule("boolean", rules::boolean),
    // Literal comparison
    rule("eq", rules::eq),
    rule("not_eq", rules::not_eq),
    rule("lt", rules::lt),
    rule("lte", rules::lte),
    rule("gt", rules::gt),
    rule("gte", rules::gte),
    // Cross-field comparison
    rule("eq_than", rules::eq_than),
    rule("not_eq_than", rules::not_eq_than),
    rule("lt_than", rules::lt_than),
    rule("lte_than", rules::lte_than),
    rule("gt_than", rules::gt_than),
    rule("gte_than", rules::gte_than),
    // Size
    rule("min", rules::min),
    rule("max", rules::max),
    rule("between", rules::between),
    rule("length", rules::length),
    rule("length_min", rules::length_min),
    rule("length_max", rules::length_max),
    rule("length_between", rules::length_between),
    rule("count_min", rules::count_min),
    rule("count_max", rules::count_max),
    rule("count_between", rules::count_between),
    // Type and format
    rule("arr", rules::arr),
    rule("json", mutators::json),
    rule("numeric", rules::numeric),
    rule("integer", rules::integer),
    rule("number", rules::number),
    rule("multi_number", rules::multi_number),
    rule("ip", rules::ip),
    rule("ipv4", rules::ipv4),
    rule("ipv6", rules::ipv6),
    rule("email", rules::email),
    rule("ascii", rules::ascii),
    rule("url", rules::url),
    rule("alpha", rules::alpha),
    rule("alpha_num", rules::alpha_num),
    rule("alpha_dash", rules::alpha_dash),
    rule("regex", rules::regex),
    // Sets
    rule("in", rules::in_list),
    rule("not_in", rules::not_in_list),
    rule("list_contains", rules::list_contains),
    rule("contains", rules::contains),
    rule("subset", rules::subset),
    rule("contains_unique", rules::contains_unique),
    // Dates
    rule("date", rules::date),
    rule("date_format", rules::date_format),
    rule("before", rules::before),
    rule("after", rules::after),
    rule("time_scope_max", rules::time_scope_max),
    rule("time_scope_min", rules::time_scope_min),
    // Mutators
    must("to_array", mutators::to_array),
    rule("item", mutators::item),
    must("default", mutators::default),
    must("assign", mutators::assign),
    must("assign_with", mutators::assign_with),
    rule("to_date_time_start", mutators::to_date_time_start),
    rule("to_date_time_end", mutators::to_date_time_end),
];

/// Look up a built-in rule by name.
pub fn lookup_builtin(name: &str) -> Option<&'static BuiltinRule> {
    BUILTIN_RULES.iter().find(|r| r.name == name)
}

// ─── Registry ───────────────────────────────────────────────────────────────

#[derive(Default)]
struct RegistryState {
    rules: HashMap<String, Arc<ExternalFn>>,
    must_run: HashSet<String>,
}

/// Externally registered rules.
///
/// A `Registry` is a shared handle: clones see the same table, so a rule
/// registered through any clone is visible to every validator holding one,
/// including validators constructed before the registration. Register rules
/// during setup, before validation starts.
#[derive(Clone, Default)]
pub struct Registry {
    state: Arc<RwLock<RegistryState>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register `handler` under `name`, replacing any previous registration.
    ///
    /// Registered rules take precedence over built-ins of the same name.
    /// With `must_run`, the rule also runs when the field is blank.
    pub fn register<F>(&self, name: impl Into<String>, handler: F, must_run: bool)
    where
        F: Fn(&Value, &mut RuleContext<'_>, &[Arg]) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(rule = %name, must_run, "registered external rule");
        let mut state = self.write();
        if must_run {
            state.must_run.insert(name.clone());
        } else {
            state.must_run.remove(&name);
        }
        state.rules.insert(name, Arc::new(handler));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.read().rules.contains_key(name)
    }

    /// Whether `name` runs on blank values: a must-run built-in or a rule
    /// registered with `must_run`.
    pub fn is_must_run(&self, name: &str) -> bool {
        lookup_builtin(name).is_some_and(|r| r.must_run) || self.read().must_run.contains(name)
    }

    /// Resolve a rule name to a handler. Registered rules win over built-ins.
    pub fn resolve(&self, name: &str) -> Result<Handler> {
        if let Some(handler) = self.read().rules.get(name) {
            return Ok(Handler::External(Arc::clone(handler)));
        }
        match lookup_builtin(name) {
            Some(builtin) => Ok(Handler::Builtin(builtin.handler)),
            None => {
                tracing::warn!(rule = name, "no handler for rule");
                Err(ValidatorError::UnknownRule {
                    rule: name.to_string(),
                })
            }
        }
    }

    // A handler that panicked mid-registration leaves the map usable.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let mut names: Vec<&String> = state.rules.keys().collect();
        names.sort();
        f.debug_struct("Registry")
            .field("rules", &names)
            .field("must_run", &state.must_run)
            .finish()
    }
}

/// A resolved rule handler.
#[derive(Clone)]
pub enum Handler {
    Builtin(BuiltinFn),
    External(Arc<ExternalFn>),
}

impl Handler {
    pub fn invoke(&self, ctx: &mut RuleContext<'_>, value: &Value, args: &[Arg]) -> Result<bool> {
        match self {
            Handler::Builtin(f) => f(ctx, value, args),
            Handler::External(f) => Ok(f(value, ctx, args)),
        }
    }
}

/// Resolve `rule` and run it against `value` for `field`, with `data` as the
/// bag the handler may read and write.
pub(crate) fn execute(
    registry: &Registry,
    data: &mut DataBag,
    field: &str,
    rule: &str,
    value: &Value,
    args: &[Arg],
) -> Result<bool> {
    let handler = registry.resolve(rule)?;
    let mut ctx = RuleContext {
        field,
        rule,
        data,
        registry,
        slot: None,
    };
    handler.invoke(&mut ctx, value, args)
}

// ─── RuleContext ────────────────────────────────────────────────────────────

/// What a handler may see and touch while it runs.
///
/// Reads go through [`RuleContext::value`]; the only mutation available is
/// replacing field values in the bag, which later rules observe.
///
/// A context created by [`RuleContext::dispatch_element`] is bound to one
/// element of the field's list: [`RuleContext::replace`] rewrites that element
/// and leaves the rest of the field alone.
pub struct RuleContext<'a> {
    field: &'a str,
    rule: &'a str,
    data: &'a mut DataBag,
    registry: &'a Registry,
    slot: Option<&'a mut Value>,
}

impl<'a> RuleContext<'a> {
    /// The field under validation.
    pub fn field(&self) -> &str {
        self.field
    }

    /// The rule being run.
    pub fn rule(&self) -> &str {
        self.rule
    }

    /// Current value of any field in the bag.
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn set_value(&mut self, field: &str, value: Value) {
        self.data.insert(field.to_string(), value);
    }

    /// Replace the value under validation: the field, or the bound element.
    pub fn replace(&mut self, value: Value) {
        match self.slot.as_deref_mut() {
            Some(slot) => *slot = value,
            None => {
                self.data.insert(self.field.to_string(), value);
            }
        }
    }

    /// Run another rule against `value` in the context of the same field.
    /// Replacements land wherever this context's own would.
    pub fn dispatch(&mut self, rule: &str, value: &Value, args: &[Arg]) -> Result<bool> {
        let handler = self.registry.resolve(rule)?;
        let mut ctx = RuleContext {
            field: self.field,
            rule,
            data: &mut *self.data,
            registry: self.registry,
            slot: self.slot.as_deref_mut(),
        };
        handler.invoke(&mut ctx, value, args)
    }

    /// Run another rule against one element of the field. Replacements made
    /// by that rule rewrite `element` only.
    pub fn dispatch_element(
        &mut self,
        rule: &str,
        element: &mut Value,
        args: &[Arg],
    ) -> Result<bool> {
        let handler = self.registry.resolve(rule)?;
        let current = element.clone();
        let mut ctx = RuleContext {
            field: self.field,
            rule,
            data: &mut *self.data,
            registry: self.registry,
            slot: Some(element),
        };
        handler.invoke(&mut ctx, &current, args)
    }

    /// Argument `index`, or an [`ValidatorError::InvalidArgument`] naming the rule.
    pub fn arg<'b>(&self, args: &'b [Arg], index: usize) -> Result<&'b Arg> {
        args.get(index)
            .ok_or_else(|| self.invalid(format!("missing argument #{}", index + 1)))
    }

    /// Argument `index` read as text.
    pub fn text_arg(&self, args: &[Arg], index: usize) -> Result<String> {
        let arg = self.arg(args, index)?;
        arg.text()
            .ok_or_else(|| self.invalid(format!("argument #{} must be a scalar, got {}", index + 1, arg)))
    }

    /// Argument `index` read as a number.
    pub fn number_arg(&self, args: &[Arg], index: usize) -> Result<f64> {
        let arg = self.arg(args, index)?;
        arg.as_f64()
            .ok_or_else(|| self.invalid(format!("argument #{} must be numeric, got '{}'", index + 1, arg)))
    }

    pub(crate) fn invalid(&self, message: impl Into<String>) -> ValidatorError {
        ValidatorError::invalid_argument(self.rule, message)
    }
}
