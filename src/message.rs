//! Failure message rendering.

use crate::error::{Result, ValidatorError};
use crate::types::Arg;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([a-z\d_]+)\}").unwrap());

/// Resolves the message for a failing `(field, rule, args)`.
///
/// Sources, most specific first:
/// 1. `messages["field.rule"]`, verbatim
/// 2. `messages["field"]`, verbatim
/// 3. `templates[rule]`, with placeholders substituted
/// 4. `"<field> cannot pass the rule of <rule>"`
///
/// Template placeholders: `{field}` is the field's alias (or name), `{args}`
/// the arguments joined with `,`, `{0}`, `{1}`... a positional argument, and
/// `{other}` the alias (or name) of the field named by argument 0.
#[derive(Clone, Copy, Debug)]
pub struct MessageResolver<'a> {
    pub aliases: &'a HashMap<String, String>,
    pub messages: &'a HashMap<String, String>,
    pub templates: &'a HashMap<String, String>,
}

impl MessageResolver<'_> {
    pub fn render(&self, field: &str, rule: &str, args: &[Arg]) -> Result<String> {
        if let Some(message) = self.messages.get(&format!("{}.{}", field, rule)) {
            return Ok(message.clone());
        }
        if let Some(message) = self.messages.get(field) {
            return Ok(message.clone());
        }
        match self.templates.get(rule) {
            Some(template) => self.substitute(template, field, rule, args),
            None => Ok(format!("{} cannot pass the rule of {}", field, rule)),
        }
    }

    fn label<'s>(&'s self, field: &'s str) -> &'s str {
        self.aliases.get(field).map(String::as_str).unwrap_or(field)
    }

    fn substitute(&self, template: &str, field: &str, rule: &str, args: &[Arg]) -> Result<String> {
        let mut fault = None;
        let rendered = PLACEHOLDER_RE.replace_all(template, |caps: &Captures<'_>| {
            let token = &caps[1];
            match self.token(token, field, args) {
                Some(text) => text,
                None => {
                    fault.get_or_insert_with(|| token.to_string());
                    String::new()
                }
            }
        });
        match fault {
            Some(placeholder) => Err(ValidatorError::MessageTemplateFault {
                rule: rule.to_string(),
                placeholder,
            }),
            None => Ok(rendered.into_owned()),
        }
    }

    fn token(&self, token: &str, field: &str, args: &[Arg]) -> Option<String> {
        match token {
            "field" => Some(self.label(field).to_string()),
            "args" => Some(
                args.iter()
                    .map(Arg::to_string)
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            "other" => {
                let other = args.first()?.to_string();
                Some(self.label(&other).to_string())
            }
            index => {
                let index: usize = index.parse().ok()?;
                args.get(index).map(Arg::to_string)
            }
        }
    }
}
