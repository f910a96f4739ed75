use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// The field bag under validation. Key order follows insertion order.
pub type DataBag = serde_json::Map<String, Value>;

/// Every rule attempted on a field, keyed by rule name, with its arguments.
pub type FieldRules = HashMap<String, Vec<Arg>>;

/// Field name → rules attempted on that field.
pub type FieldRecord = HashMap<String, FieldRules>;

// ─── Arg ────────────────────────────────────────────────────────────────────

/// A rule argument literal.
///
/// Arguments written in a rule string (`between:1,10`) are always `Str`, except
/// for `true`/`false` which become `Bool`. Arguments supplied through the named
/// form (`{ in: [1, 2] }`) keep whatever shape the payload had.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Arg>),
    Map(Vec<(String, Arg)>),
}

impl Arg {
    /// Coerce one token from a rule string.
    pub fn from_token(token: &str) -> Arg {
        if token.eq_ignore_ascii_case("true") {
            Arg::Bool(true)
        } else if token.eq_ignore_ascii_case("false") {
            Arg::Bool(false)
        } else {
            Arg::Str(token.to_string())
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text view of a scalar argument. Lists and maps have none.
    pub fn text(&self) -> Option<String> {
        match self {
            Arg::Str(s) => Some(s.clone()),
            Arg::Int(i) => Some(i.to_string()),
            Arg::Float(f) => Some(f.to_string()),
            Arg::Bool(b) => Some(b.to_string()),
            Arg::Null | Arg::List(_) | Arg::Map(_) => None,
        }
    }

    /// Numeric view: numbers, and strings that read as numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Arg::Int(i) => Some(*i as f64),
            Arg::Float(f) => Some(*f),
            Arg::Str(s) => crate::value::parse_numeric(s),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Arg::Null => Value::Null,
            Arg::Bool(b) => Value::Bool(*b),
            Arg::Int(i) => Value::from(*i),
            Arg::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Arg::Str(s) => Value::String(s.clone()),
            Arg::List(items) => Value::Array(items.iter().map(Arg::to_value).collect()),
            Arg::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_value()))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for Arg {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Arg::Int(i),
                None => Arg::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Arg::Str(s.clone()),
            Value::Array(items) => Arg::List(items.iter().map(Arg::from).collect()),
            Value::Object(map) => Arg::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Arg::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_string())
    }
}

impl From<i64> for Arg {
    fn from(i: i64) -> Self {
        Arg::Int(i)
    }
}

impl From<bool> for Arg {
    fn from(b: bool) -> Self {
        Arg::Bool(b)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text() {
            Some(text) => f.write_str(&text),
            None => write!(f, "{}", self.to_value()),
        }
    }
}

impl Serialize for Arg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

// ─── RuleSpec / RuleToken ───────────────────────────────────────────────────

/// A parsed rule: its name and argument list.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleSpec {
    pub name: String,
    pub args: Vec<Arg>,
}

/// One unparsed entry of a field's rule chain.
#[derive(Clone, Debug, PartialEq)]
pub enum RuleToken {
    /// `"min:3"`: name and comma-separated arguments in one string.
    Bare(String),
    /// `{ min: 3 }`: the payload is passed as the single argument.
    Named { name: String, payload: Value },
}

impl RuleToken {
    pub fn named(name: impl Into<String>, payload: impl Into<Value>) -> Self {
        RuleToken::Named {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

impl From<&str> for RuleToken {
    fn from(s: &str) -> Self {
        RuleToken::Bare(s.to_string())
    }
}

/// The ordered rules declared for one field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleChain(pub Vec<RuleToken>);

impl RuleChain {
    pub fn iter(&self) -> std::slice::Iter<'_, RuleToken> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A pipe-delimited rule string, e.g. `"required|number"`.
impl From<&str> for RuleChain {
    fn from(rules: &str) -> Self {
        RuleChain(crate::parse::split_chain(rules))
    }
}

impl From<Vec<RuleToken>> for RuleChain {
    fn from(tokens: Vec<RuleToken>) -> Self {
        RuleChain(tokens)
    }
}

impl From<Vec<&str>> for RuleChain {
    fn from(tokens: Vec<&str>) -> Self {
        RuleChain(tokens.into_iter().map(RuleToken::from).collect())
    }
}

// ─── RuleGroup ──────────────────────────────────────────────────────────────

/// Field name → rule chain, in declaration order.
///
/// Fields run in the order they were added; adding a field twice replaces its
/// chain in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuleGroup {
    entries: Vec<(String, RuleChain)>,
}

impl RuleGroup {
    pub fn new() -> Self {
        RuleGroup::default()
    }

    /// Builder form of [`RuleGroup::insert`].
    pub fn with(mut self, field: impl Into<String>, rules: impl Into<RuleChain>) -> Self {
        self.insert(field, rules);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, rules: impl Into<RuleChain>) {
        let field = field.into();
        let rules = rules.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = rules,
            None => self.entries.push((field, rules)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&RuleChain> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, chain)| chain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleChain)> {
        self.entries.iter().map(|(name, chain)| (name.as_str(), chain))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'de> Deserialize<'de> for RuleGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        crate::parse::rule_group_from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ─── Condition ──────────────────────────────────────────────────────────────

/// Input to [`Validator::when`](crate::Validator::when).
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Every rule of the group must pass.
    Rules(RuleGroup),
    /// Used as-is.
    Flag(bool),
}

impl From<RuleGroup> for Condition {
    fn from(group: RuleGroup) -> Self {
        Condition::Rules(group)
    }
}

impl From<bool> for Condition {
    fn from(flag: bool) -> Self {
        Condition::Flag(flag)
    }
}

// ─── FailureMode ────────────────────────────────────────────────────────────

/// What the engine does when a rule fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Record the message and keep going.
    #[default]
    Collect,
    /// Return the first failure as [`ValidatorError::RuleFailure`](crate::ValidatorError::RuleFailure).
    Throw,
}

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Collected failure messages, per field, in execution order.
///
/// A field with no entry has had no failures.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Errors {
    entries: Vec<(String, Vec<String>)>,
}

impl Errors {
    pub(crate) fn push(&mut self, field: &str, message: String) {
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field.to_string(), vec![message])),
        }
    }

    /// Messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// First message for `field`, or the first message of the first failing
    /// field when `field` is `None`.
    pub fn first(&self, field: Option<&str>) -> Option<&str> {
        match field {
            Some(field) => self.get(field)?.first().map(String::as_str),
            None => self
                .entries
                .first()
                .and_then(|(_, messages)| messages.first())
                .map(String::as_str),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Number of fields with at least one failure.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Errors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, messages) in &self.entries {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}
