//! Constraint validation for hierarchically structured form responses.
//!
//! A response document is checked node by node against its schema document:
//!
//! ```text
//! validate(schema_node, response_node, evaluator) → ValidationOutcome
//! ```
//!
//! Two node-level rules (required, declared constraint expressions) and six
//! value-level rules (min/max value, min/max length, decimal places, regex
//! pattern) run in a fixed order and aggregate into one outcome per node:
//! `Valid`, `NotValidated` (hidden, skipped), or `Invalid` with the ordered
//! list of every violation found. Rules whose bound or condition is an
//! expression suspend on the [`evaluate::ExpressionEvaluator`] collaborator.
//!
//! # Quick Start
//!
//! ```rust
//! use formcheck::{AnswerValue, Bound, ResponseNode, SchemaNode};
//! use formcheck::evaluate::DefaultCelEvaluator;
//!
//! let mut schema = SchemaNode::new("age");
//! schema.required = true;
//! schema.min_value = Some(Bound::Literal(0.0));
//! schema.max_value = Some(Bound::Literal(130.0));
//!
//! let response = ResponseNode::with_values("age", vec![AnswerValue::Integer(200)]);
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let outcome = formcheck::validate(&schema, &response, &DefaultCelEvaluator)
//!     .await
//!     .expect("well-formed schema");
//! assert_eq!(outcome.messages().len(), 1);
//! # });
//! ```
//!
//! # Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `cel-eval` | yes     | CEL expression evaluation via the [`cel`] crate. Enables [`evaluate::DefaultCelEvaluator`]. |

pub mod error;
pub mod evaluate;
pub mod outcome;
pub mod rules;
pub mod types;
pub mod validate;

pub use error::*;
pub use outcome::*;
pub use types::*;

// Re-export the entry point at the crate root for convenience.
pub use validate::validate;

use evaluate::ExpressionEvaluator;
use std::pin::Pin;

/// Convenience entry point validating a whole schema/response tree.
///
/// Walks the schema pre-order, pairing each schema child with the response
/// child carrying the same `link_id`. A schema child the response omits is
/// validated against an empty synthetic node, so a missing required answer
/// is still reported. Per-node semantics are exactly [`validate`].
///
/// Returns `(link_id, outcome)` pairs in pre-order.
///
/// # Errors
///
/// Propagates the first [`EvaluationError`] encountered, abandoning the
/// rest of the walk.
pub async fn validate_tree<E: ExpressionEvaluator>(
    schema: &SchemaNode,
    response: &ResponseNode,
    evaluator: &E,
) -> Result<Vec<(String, ValidationOutcome)>, EvaluationError> {
    let mut results = Vec::new();
    walk(schema, response, evaluator, &mut results).await?;
    Ok(results)
}

// Recursion through a boxed future; async fn cannot recurse directly.
fn walk<'a, E: ExpressionEvaluator>(
    schema: &'a SchemaNode,
    response: &'a ResponseNode,
    evaluator: &'a E,
    results: &'a mut Vec<(String, ValidationOutcome)>,
) -> Pin<Box<dyn Future<Output = Result<(), EvaluationError>> + 'a>> {
    Box::pin(async move {
        let outcome = validate(schema, response, evaluator).await?;
        results.push((schema.link_id.clone(), outcome));

        for child in &schema.items {
            match response.items.iter().find(|r| r.link_id == child.link_id) {
                Some(paired) => walk(child, paired, evaluator, results).await?,
                None => {
                    let absent = ResponseNode::empty(child.link_id.clone());
                    walk(child, &absent, evaluator, results).await?;
                }
            }
        }
        Ok(())
    })
}
