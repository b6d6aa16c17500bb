//! The orchestrator: one entry point coordinating the node rules, the
//! value-rule × answer cross-product, and aggregation.
//!
//! Returns **all** violations, not just the first — both rule passes run to
//! completion so a caller receives the complete picture in one call.

use crate::error::EvaluationError;
use crate::evaluate::{ExpressionEvaluator, ExpressionScope};
use crate::outcome::{RuleOutcome, ValidationOutcome};
use crate::rules::{NODE_RULES, VALUE_RULES};
use crate::types::{ResponseNode, SchemaNode};

/// Whether a node is validated at all. The skip decision is taken before
/// any rule runs, so it is modeled as its own state rather than an early
/// return buried in the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Hidden node: no rule is evaluated, no expression is resolved.
    Skip,
    Evaluate,
}

impl Disposition {
    pub fn of(schema: &SchemaNode) -> Self {
        if schema.hidden {
            Disposition::Skip
        } else {
            Disposition::Evaluate
        }
    }
}

/// Validate one response node against its schema node.
///
/// Hidden nodes short-circuit to [`ValidationOutcome::NotValidated`] without
/// invoking the evaluator. Otherwise every node rule runs in registry order,
/// then every value rule runs once per attached answer (rule-major, answer
/// order within a rule), and the outcomes aggregate into a single
/// [`ValidationOutcome`]. Rules and answers are visited strictly
/// sequentially, so message order is deterministic.
///
/// Child nodes are the caller's responsibility; see [`crate::validate_tree`]
/// for a recursive convenience wrapper.
///
/// # Errors
///
/// Propagates [`EvaluationError`] from the Expression Evaluator unchanged —
/// a malformed expression is a schema-authoring defect, not a data-validity
/// finding, and is never converted into a validation message.
pub async fn validate<E: ExpressionEvaluator>(
    schema: &SchemaNode,
    response: &ResponseNode,
    evaluator: &E,
) -> Result<ValidationOutcome, EvaluationError> {
    match Disposition::of(schema) {
        Disposition::Skip => Ok(ValidationOutcome::NotValidated),
        Disposition::Evaluate => evaluate_rules(schema, response, evaluator).await,
    }
}

/// The evaluated branch of the pass: both rule sweeps, then aggregation.
/// The aggregate is constructed only after both sweeps complete, so a
/// cancelled call never exposes a partial result.
async fn evaluate_rules<E: ExpressionEvaluator>(
    schema: &SchemaNode,
    response: &ResponseNode,
    evaluator: &E,
) -> Result<ValidationOutcome, EvaluationError> {
    let scope = ExpressionScope::new(schema, response, evaluator);
    let mut outcomes: Vec<RuleOutcome> = Vec::new();

    for rule in NODE_RULES {
        outcomes.extend(rule.evaluate(schema, response, &scope).await?);
    }

    for rule in VALUE_RULES {
        for value in &response.values {
            outcomes.push(rule.evaluate(schema, value, &scope).await?);
        }
    }

    Ok(ValidationOutcome::aggregate(outcomes))
}
