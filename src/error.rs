use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, ValidatorError>;

/// Error kind for parse failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    Syntax,
    TypeMismatch,
}

/// Produced when a rule group or configuration document cannot be decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        ParseError {
            kind: ParseErrorKind::Syntax,
            message: message.into(),
            path: None,
        }
    }

    pub(crate) fn type_mismatch(path: impl Into<String>, message: impl Into<String>) -> Self {
        let path = path.into();
        ParseError {
            kind: ParseErrorKind::TypeMismatch,
            message: format!("{}: {}", path, message.into()),
            path: Some(path),
        }
    }
}

/// Every failure the engine can report.
///
/// Only [`ValidatorError::RuleFailure`] is a data error, and it is only
/// returned when the validator runs in [`FailureMode::Throw`](crate::FailureMode).
/// The remaining kinds describe a malformed rule group or configuration and are
/// returned regardless of the failure mode.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidatorError {
    /// A rule returned `false` for a field. Displays as the rendered message.
    #[error("{message}")]
    RuleFailure {
        field: String,
        rule: String,
        message: String,
    },

    /// Neither a registered nor a built-in handler exists for the rule name.
    #[error("unknown rule: '{rule}'")]
    UnknownRule { rule: String },

    /// A message template references a placeholder that cannot be resolved.
    #[error("message template for rule '{rule}' has unresolvable placeholder '{{{placeholder}}}'")]
    MessageTemplateFault { rule: String, placeholder: String },

    /// A rule was given an argument it cannot work with.
    #[error("invalid argument for rule '{rule}': {message}")]
    InvalidArgument { rule: String, message: String },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

impl ValidatorError {
    pub(crate) fn invalid_argument(rule: &str, message: impl Into<String>) -> Self {
        ValidatorError::InvalidArgument {
            rule: rule.to_string(),
            message: message.into(),
        }
    }

    /// True for data errors, false for configuration errors.
    pub fn is_rule_failure(&self) -> bool {
        matches!(self, ValidatorError::RuleFailure { .. })
    }
}
