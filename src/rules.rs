//! The rule set: two node-level rules and six value-level rules, dispatched
//! as closed enums so registry order and exhaustiveness stay checkable at
//! compile time.
//!
//! Every rule is stateless and side-effect-free. Only `Constraints`,
//! `MinValue`, and `MaxValue` may suspend, and only when they need the
//! Expression Evaluator; the structural rules never touch it.

use crate::error::{EvaluationError, EvaluationErrorKind};
use crate::evaluate::{ExpressionEvaluator, ExpressionScope};
use crate::outcome::RuleOutcome;
use crate::types::{AnswerValue, Bound, ResponseNode, SchemaNode};
use regex::Regex;

// ─── Registries ──────────────────────────────────────────────────────────────

/// Node-level rules, in evaluation (and therefore message) order.
pub const NODE_RULES: [NodeRule; 2] = [NodeRule::Required, NodeRule::Constraints];

/// Value-level rules, in evaluation (and therefore message) order.
pub const VALUE_RULES: [ValueRule; 6] = [
    ValueRule::MinValue,
    ValueRule::MaxValue,
    ValueRule::MinLength,
    ValueRule::MaxLength,
    ValueRule::MaxDecimalPlaces,
    ValueRule::Pattern,
];

// ─── Node rules ──────────────────────────────────────────────────────────────

/// A rule evaluated once per response node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRule {
    /// Fails when the schema marks the field mandatory and the node has no
    /// non-empty answer.
    Required,
    /// Checks every declared constraint expression; each false expression
    /// contributes one failure carrying the constraint's own message.
    Constraints,
}

impl NodeRule {
    /// Evaluate against a (schema, response) pair. Most rules yield one
    /// outcome; `Constraints` yields one per declared constraint.
    pub async fn evaluate<E: ExpressionEvaluator>(
        &self,
        schema: &SchemaNode,
        response: &ResponseNode,
        scope: &ExpressionScope<'_, E>,
    ) -> Result<Vec<RuleOutcome>, EvaluationError> {
        match self {
            NodeRule::Required => Ok(vec![required(schema, response)]),
            NodeRule::Constraints => {
                let mut outcomes = Vec::with_capacity(schema.constraints.len());
                for constraint in &schema.constraints {
                    let holds = scope.boolean(&constraint.expression).await?;
                    outcomes.push(RuleOutcome::check(holds, || constraint.human.clone()));
                }
                Ok(outcomes)
            }
        }
    }
}

fn required(schema: &SchemaNode, response: &ResponseNode) -> RuleOutcome {
    let answered = response.values.iter().any(|v| !v.is_empty());
    RuleOutcome::check(!schema.required || answered, || {
        let label = schema.text.as_deref().unwrap_or(&schema.link_id);
        format!("'{}': an answer is required", label)
    })
}

// ─── Value rules ─────────────────────────────────────────────────────────────

/// A rule evaluated once per answer value attached to a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueRule {
    MinValue,
    MaxValue,
    MinLength,
    MaxLength,
    MaxDecimalPlaces,
    Pattern,
}

impl ValueRule {
    /// Evaluate against one answer value. A rule whose precondition does
    /// not apply (no declared bound, non-numeric value for a numeric rule)
    /// passes vacuously.
    pub async fn evaluate<E: ExpressionEvaluator>(
        &self,
        schema: &SchemaNode,
        value: &AnswerValue,
        scope: &ExpressionScope<'_, E>,
    ) -> Result<RuleOutcome, EvaluationError> {
        match self {
            ValueRule::MinValue => {
                let Some((n, min)) = numeric_bound(&schema.min_value, value, scope).await? else {
                    return Ok(RuleOutcome::Valid);
                };
                Ok(RuleOutcome::check(n >= min, || {
                    format!("value {} is below the minimum of {}", value.display(), min)
                }))
            }
            ValueRule::MaxValue => {
                let Some((n, max)) = numeric_bound(&schema.max_value, value, scope).await? else {
                    return Ok(RuleOutcome::Valid);
                };
                Ok(RuleOutcome::check(n <= max, || {
                    format!("value {} exceeds the maximum of {}", value.display(), max)
                }))
            }
            ValueRule::MinLength => {
                let Some(min) = schema.min_length else {
                    return Ok(RuleOutcome::Valid);
                };
                if value.is_empty() {
                    return Ok(RuleOutcome::Valid);
                }
                let len = value.display().chars().count();
                Ok(RuleOutcome::check(len >= min, || {
                    format!("answer is shorter than the minimum length of {}", min)
                }))
            }
            ValueRule::MaxLength => {
                let Some(max) = schema.max_length else {
                    return Ok(RuleOutcome::Valid);
                };
                let len = value.display().chars().count();
                Ok(RuleOutcome::check(len <= max, || {
                    format!("answer exceeds the maximum length of {}", max)
                }))
            }
            ValueRule::MaxDecimalPlaces => {
                let (Some(max), Some(places)) =
                    (schema.max_decimal_places, value.decimal_places())
                else {
                    return Ok(RuleOutcome::Valid);
                };
                Ok(RuleOutcome::check(places <= max, || {
                    format!("answer has more than {} decimal places", max)
                }))
            }
            ValueRule::Pattern => {
                let Some(pattern) = &schema.pattern else {
                    return Ok(RuleOutcome::Valid);
                };
                let re = full_match_regex(pattern)?;
                let text = value.display();
                Ok(RuleOutcome::check(re.is_match(&text), || {
                    format!("answer does not match the required pattern '{}'", pattern)
                }))
            }
        }
    }
}

/// Resolve a numeric rule's inputs: the value as a number and the declared
/// bound, literal or expression-derived. `None` when the rule does not
/// apply to this (schema, value) pair.
async fn numeric_bound<E: ExpressionEvaluator>(
    bound: &Option<Bound>,
    value: &AnswerValue,
    scope: &ExpressionScope<'_, E>,
) -> Result<Option<(f64, f64)>, EvaluationError> {
    let (Some(bound), Some(n)) = (bound, value.as_number()) else {
        return Ok(None);
    };
    let limit = match bound {
        Bound::Literal(l) => *l,
        Bound::Expression(expr) => scope.number(expr).await?,
    };
    Ok(Some((n, limit)))
}

/// Compile a schema pattern anchored to the whole string. A pattern that
/// does not compile is a schema-authoring defect, not a data failure.
fn full_match_regex(pattern: &str) -> Result<Regex, EvaluationError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
        EvaluationError::new(
            EvaluationErrorKind::InvalidPattern,
            format!("invalid pattern: {}", e),
        )
        .with_expression(pattern)
    })
}
