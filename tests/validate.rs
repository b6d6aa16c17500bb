//! Orchestration behavior: skip policy, aggregation, ordering, propagation.

use formcheck::error::{EvaluationError, EvaluationErrorKind};
use formcheck::evaluate::ExpressionEvaluator;
use formcheck::types::*;
use formcheck::validate::{Disposition, validate};
use formcheck::{RuleOutcome, ValidationOutcome};
use serde_json::Value;
use std::cell::Cell;
use std::collections::HashMap;

/// Evaluator stub returning canned results per expression string and
/// counting invocations.
struct StubEvaluator {
    results: HashMap<String, Value>,
    calls: Cell<usize>,
}

impl StubEvaluator {
    fn new(entries: &[(&str, Value)]) -> Self {
        StubEvaluator {
            results: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            calls: Cell::new(0),
        }
    }

    fn empty() -> Self {
        StubEvaluator::new(&[])
    }
}

impl ExpressionEvaluator for StubEvaluator {
    async fn evaluate(
        &self,
        _schema: &SchemaNode,
        _response: &ResponseNode,
        expression: &str,
    ) -> Result<Value, EvaluationError> {
        self.calls.set(self.calls.get() + 1);
        self.results.get(expression).cloned().ok_or_else(|| {
            EvaluationError::new(
                EvaluationErrorKind::Expression,
                format!("unknown expression: {}", expression),
            )
            .with_expression(expression)
        })
    }
}

fn constraint(key: &str, expression: &str, human: &str) -> Constraint {
    Constraint {
        key: key.to_string(),
        severity: ConstraintSeverity::Error,
        expression: expression.to_string(),
        human: human.to_string(),
    }
}

// ─── Hidden-skip policy ─────────────────────────────────────────────────────

#[test]
fn disposition_skips_only_hidden_nodes() {
    let mut schema = SchemaNode::new("q1");
    assert_eq!(Disposition::of(&schema), Disposition::Evaluate);
    schema.hidden = true;
    assert_eq!(Disposition::of(&schema), Disposition::Skip);
}

#[tokio::test]
async fn hidden_node_is_not_validated_and_evaluator_is_never_invoked() {
    let mut schema = SchemaNode::new("q1");
    schema.hidden = true;
    schema.required = true;
    schema.max_length = Some(1);
    schema.constraints = vec![constraint("c1", "value > 0", "must be positive")];

    // Data that would fail every declared rule if the node were visible.
    let response = ResponseNode::with_values("q1", vec![AnswerValue::Text("abcdef".into())]);

    let evaluator = StubEvaluator::empty();
    let outcome = validate(&schema, &response, &evaluator).await.unwrap();

    assert_eq!(outcome, ValidationOutcome::NotValidated);
    assert!(!outcome.was_evaluated());
    assert_eq!(evaluator.calls.get(), 0);
}

#[test]
fn not_validated_is_distinct_from_valid() {
    assert_ne!(ValidationOutcome::NotValidated, ValidationOutcome::Valid);
    assert!(!ValidationOutcome::NotValidated.is_valid());
}

// ─── Aggregation ────────────────────────────────────────────────────────────

#[tokio::test]
async fn all_rules_passing_yields_valid_with_no_messages() {
    let mut schema = SchemaNode::new("q1");
    schema.required = true;
    schema.min_value = Some(Bound::Literal(0.0));
    schema.max_value = Some(Bound::Literal(100.0));
    schema.max_length = Some(10);

    let response = ResponseNode::with_values("q1", vec![AnswerValue::Integer(42)]);

    let outcome = validate(&schema, &response, &StubEvaluator::empty())
        .await
        .unwrap();
    assert_eq!(outcome, ValidationOutcome::Valid);
    assert!(outcome.messages().is_empty());
}

#[tokio::test]
async fn required_field_with_no_values_yields_one_message() {
    let mut schema = SchemaNode::new("q1");
    schema.required = true;

    let outcome = validate(&schema, &ResponseNode::empty("q1"), &StubEvaluator::empty())
        .await
        .unwrap();

    let msgs = outcome.messages();
    assert_eq!(msgs.len(), 1);
    assert!(msgs[0].contains("required"), "got: {}", msgs[0]);
}

#[tokio::test]
async fn max_length_reports_only_the_offending_value() {
    let mut schema = SchemaNode::new("q1");
    schema.max_length = Some(5);

    let too_long = ResponseNode::with_values("q1", vec![AnswerValue::Text("abcdef".into())]);
    let outcome = validate(&schema, &too_long, &StubEvaluator::empty())
        .await
        .unwrap();
    assert_eq!(outcome.messages().len(), 1);
    assert!(outcome.messages()[0].contains("maximum length of 5"));

    let short = ResponseNode::with_values("q1", vec![AnswerValue::Text("abc".into())]);
    let outcome = validate(&schema, &short, &StubEvaluator::empty())
        .await
        .unwrap();
    assert!(outcome.is_valid());
}

#[tokio::test]
async fn failed_constraint_reports_its_declared_message() {
    let mut schema = SchemaNode::new("q1");
    schema.constraints = vec![constraint("c1", "value > 0", "must be positive")];

    let response = ResponseNode::with_values("q1", vec![AnswerValue::Integer(-3)]);
    let evaluator = StubEvaluator::new(&[("value > 0", Value::Bool(false))]);

    let outcome = validate(&schema, &response, &evaluator).await.unwrap();
    assert_eq!(
        outcome,
        ValidationOutcome::Invalid(vec!["must be positive".to_string()])
    );
}

#[tokio::test]
async fn cross_product_reports_each_failing_value_once() {
    // required passes (two present values); MinValue fails for 5 only.
    let mut schema = SchemaNode::new("q1");
    schema.required = true;
    schema.min_value = Some(Bound::Literal(10.0));

    let response = ResponseNode::with_values(
        "q1",
        vec![AnswerValue::Integer(5), AnswerValue::Integer(20)],
    );

    let outcome = validate(&schema, &response, &StubEvaluator::empty())
        .await
        .unwrap();
    let msgs = outcome.messages();
    assert_eq!(msgs.len(), 1);
    assert!(msgs[0].contains("below the minimum of 10"), "got: {}", msgs[0]);
}

#[tokio::test]
async fn no_early_exit_all_violations_are_collected() {
    let mut schema = SchemaNode::new("q1");
    schema.max_length = Some(3);
    schema.constraints = vec![constraint("c1", "check()", "constraint failed")];

    let response = ResponseNode::with_values(
        "q1",
        vec![
            AnswerValue::Text("abcd".into()),
            AnswerValue::Text("ab".into()),
            AnswerValue::Text("abcde".into()),
        ],
    );
    let evaluator = StubEvaluator::new(&[("check()", Value::Bool(false))]);

    let outcome = validate(&schema, &response, &evaluator).await.unwrap();
    // Node-rule failure first, then value failures in answer order.
    assert_eq!(outcome.messages().len(), 3);
    assert_eq!(outcome.messages()[0], "constraint failed");
    assert!(outcome.messages()[1].contains("maximum length"));
    assert!(outcome.messages()[2].contains("maximum length"));
}

#[tokio::test]
async fn message_order_is_deterministic_across_runs() {
    let mut schema = SchemaNode::new("q1");
    schema.max_length = Some(2);
    schema.constraints = vec![
        constraint("c1", "a()", "first constraint"),
        constraint("c2", "b()", "second constraint"),
    ];

    let response = ResponseNode::with_values(
        "q1",
        vec![AnswerValue::Text("ok".into()), AnswerValue::Text("xyz".into())],
    );
    let evaluator = StubEvaluator::new(&[
        ("a()", Value::Bool(false)),
        ("b()", Value::Bool(false)),
    ]);

    let first = validate(&schema, &response, &evaluator).await.unwrap();
    let second = validate(&schema, &response, &evaluator).await.unwrap();
    assert_eq!(first, second);

    // Node-rule failures lead in declaration order, then value failures.
    let msgs = first.messages();
    assert_eq!(msgs[0], "first constraint");
    assert_eq!(msgs[1], "second constraint");
    assert!(msgs[2].contains("maximum length"));
    assert_eq!(msgs.len(), 3);
}

// ─── Failure propagation ────────────────────────────────────────────────────

#[tokio::test]
async fn evaluator_failure_propagates_instead_of_becoming_a_message() {
    let mut schema = SchemaNode::new("q1");
    schema.constraints = vec![constraint("c1", "nonsense(", "never shown")];

    let response = ResponseNode::with_values("q1", vec![AnswerValue::Integer(1)]);

    let err = validate(&schema, &response, &StubEvaluator::empty())
        .await
        .unwrap_err();
    assert_eq!(err.kind, EvaluationErrorKind::Expression);
    assert_eq!(err.expression.as_deref(), Some("nonsense("));
}

#[tokio::test]
async fn non_boolean_constraint_result_is_a_type_error() {
    let mut schema = SchemaNode::new("q1");
    schema.constraints = vec![constraint("c1", "count()", "never shown")];

    let response = ResponseNode::empty("q1");
    let evaluator = StubEvaluator::new(&[("count()", Value::Number(7.into()))]);

    let err = validate(&schema, &response, &evaluator).await.unwrap_err();
    assert_eq!(err.kind, EvaluationErrorKind::TypeError);
}

// ─── Outcome aggregation unit checks ────────────────────────────────────────

#[test]
fn aggregate_is_invalid_iff_any_constituent_failed() {
    let all_pass = vec![RuleOutcome::Valid, RuleOutcome::Valid];
    assert_eq!(
        ValidationOutcome::aggregate(all_pass),
        ValidationOutcome::Valid
    );

    let one_fail = vec![
        RuleOutcome::Valid,
        RuleOutcome::Invalid("boom".into()),
        RuleOutcome::Valid,
    ];
    assert_eq!(
        ValidationOutcome::aggregate(one_fail),
        ValidationOutcome::Invalid(vec!["boom".into()])
    );

    assert_eq!(
        ValidationOutcome::aggregate(Vec::new()),
        ValidationOutcome::Valid
    );
}
