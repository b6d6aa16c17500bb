//! Outcome model: the result of one rule evaluation and the aggregate of a
//! whole pass.

use serde::{Deserialize, Serialize};

/// The result of evaluating a single rule against a node or value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleOutcome {
    Valid,
    /// The rule failed, with one human-readable message.
    Invalid(String),
}

impl RuleOutcome {
    /// `Valid` when `pass` holds, otherwise `Invalid` with the message
    /// produced by `message`.
    pub fn check(pass: bool, message: impl FnOnce() -> String) -> Self {
        if pass {
            RuleOutcome::Valid
        } else {
            RuleOutcome::Invalid(message())
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, RuleOutcome::Valid)
    }
}

/// The aggregated result of one validation pass over a node.
///
/// `NotValidated` means the node was skipped (hidden), not that it passed —
/// callers tracking coverage must treat it as distinct from `Valid`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Valid,
    NotValidated,
    /// At least one rule failed; messages in deterministic rule order.
    Invalid(Vec<String>),
}

impl ValidationOutcome {
    /// Combine rule outcomes: `Invalid` iff at least one constituent is
    /// `Invalid`, preserving message order. Never yields `NotValidated`;
    /// skipping is decided before any rule runs.
    pub fn aggregate(outcomes: impl IntoIterator<Item = RuleOutcome>) -> Self {
        let messages: Vec<String> = outcomes
            .into_iter()
            .filter_map(|o| match o {
                RuleOutcome::Valid => None,
                RuleOutcome::Invalid(msg) => Some(msg),
            })
            .collect();
        if messages.is_empty() {
            ValidationOutcome::Valid
        } else {
            ValidationOutcome::Invalid(messages)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    /// Whether any rule actually ran (false only for hidden nodes).
    pub fn was_evaluated(&self) -> bool {
        !matches!(self, ValidationOutcome::NotValidated)
    }

    /// The failure messages, empty unless `Invalid`.
    pub fn messages(&self) -> &[String] {
        match self {
            ValidationOutcome::Invalid(msgs) => msgs,
            _ => &[],
        }
    }
}
