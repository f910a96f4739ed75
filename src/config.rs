//! Injectable validator configuration.

use crate::error::ParseError;
use crate::registry::Registry;
use crate::types::FailureMode;
use serde::Deserialize;
use std::collections::HashMap;

/// Tables copied into every [`Validator`](crate::Validator) built from it.
///
/// ```rust
/// let config = rulekit::Config::from_yaml(r#"
/// aliases:
///   start_date: Start date
/// templates:
///   required: "{field} is required"
/// failure_mode: throw
/// "#).unwrap();
/// assert_eq!(config.aliases["start_date"], "Start date");
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Field name → human label used in messages.
    pub aliases: HashMap<String, String>,
    /// Verbatim messages keyed by `field.rule` or `field`.
    pub messages: HashMap<String, String>,
    /// Rule name → message template.
    pub templates: HashMap<String, String>,
    pub failure_mode: FailureMode,
    /// Externally registered rules. Shared by every clone of this config.
    #[serde(skip)]
    pub registry: Registry,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }

    pub fn from_json(input: &str) -> Result<Self, ParseError> {
        serde_json::from_str(input).map_err(|e| ParseError::syntax(e.to_string()))
    }

    pub fn from_yaml(input: &str) -> Result<Self, ParseError> {
        if input.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_saphyr::from_str(input).map_err(|e| ParseError::syntax(e.to_string()))
    }

    pub fn with_aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        extend(&mut self.aliases, aliases);
        self
    }

    pub fn with_messages<I, K, V>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        extend(&mut self.messages, messages);
        self
    }

    pub fn with_templates<I, K, V>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        extend(&mut self.templates, templates);
        self
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }
}

pub(crate) fn extend<I, K, V>(table: &mut HashMap<String, String>, entries: I)
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    table.extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
}
