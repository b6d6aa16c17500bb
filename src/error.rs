use serde::{Deserialize, Serialize};
use std::fmt;

/// Error kind for expression-evaluation failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationErrorKind {
    /// The expression is malformed or failed to execute.
    Expression,
    /// The expression executed but produced a value of the wrong type
    /// (e.g. a non-boolean constraint, a non-numeric bound).
    TypeError,
    /// A schema-declared regex pattern failed to compile.
    InvalidPattern,
}

/// A schema-authoring defect surfaced during a validation pass.
///
/// These are developer-facing failures, not data-validity findings: they
/// propagate out of [`crate::validate`] uncaught rather than being folded
/// into the message list an end user sees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationError {
    pub kind: EvaluationErrorKind,
    pub message: String,
    /// The offending expression or pattern, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
}

impl EvaluationError {
    pub fn new(kind: EvaluationErrorKind, message: impl Into<String>) -> Self {
        EvaluationError {
            kind,
            message: message.into(),
            expression: None,
        }
    }

    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into());
        self
    }
}

impl fmt::Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.expression {
            Some(expr) => write!(f, "{} (in '{}')", self.message, expr),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for EvaluationError {}
