//! Property tests for the aggregation invariant and determinism.

use formcheck::error::EvaluationError;
use formcheck::evaluate::ExpressionEvaluator;
use formcheck::types::*;
use formcheck::validate;
use formcheck::{RuleOutcome, ValidationOutcome};
use proptest::prelude::*;
use serde_json::Value;

fn rule_outcome() -> impl Strategy<Value = RuleOutcome> {
    prop_oneof![
        Just(RuleOutcome::Valid),
        "[a-z ]{1,20}".prop_map(RuleOutcome::Invalid),
    ]
}

proptest! {
    /// Invalid iff at least one constituent failed; messages keep their
    /// relative order; partial failure never resolves to Valid.
    #[test]
    fn aggregation_invariant(outcomes in prop::collection::vec(rule_outcome(), 0..12)) {
        let expected: Vec<String> = outcomes
            .iter()
            .filter_map(|o| match o {
                RuleOutcome::Valid => None,
                RuleOutcome::Invalid(m) => Some(m.clone()),
            })
            .collect();

        let aggregated = ValidationOutcome::aggregate(outcomes);
        if expected.is_empty() {
            prop_assert_eq!(aggregated, ValidationOutcome::Valid);
        } else {
            prop_assert_eq!(aggregated, ValidationOutcome::Invalid(expected));
        }
    }

    /// Two passes over identical inputs produce identical outcomes.
    #[test]
    fn validation_is_deterministic(
        answers in prop::collection::vec(-1000i64..1000, 0..6),
        min in -500i64..500,
        max in -500i64..500,
        required in any::<bool>(),
        hidden in any::<bool>(),
    ) {
        struct Unreachable;
        impl ExpressionEvaluator for Unreachable {
            async fn evaluate(
                &self,
                _schema: &SchemaNode,
                _response: &ResponseNode,
                _expression: &str,
            ) -> Result<Value, EvaluationError> {
                unreachable!("no expression-bearing rules in this schema")
            }
        }

        let mut schema = SchemaNode::new("q1");
        schema.required = required;
        schema.hidden = hidden;
        schema.min_value = Some(Bound::Literal(min as f64));
        schema.max_value = Some(Bound::Literal(max as f64));

        let response = ResponseNode::with_values(
            "q1",
            answers.into_iter().map(AnswerValue::Integer).collect(),
        );

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let first = rt.block_on(validate(&schema, &response, &Unreachable)).unwrap();
        let second = rt.block_on(validate(&schema, &response, &Unreachable)).unwrap();
        prop_assert_eq!(&first, &second);

        if hidden {
            prop_assert_eq!(first, ValidationOutcome::NotValidated);
        } else {
            prop_assert!(first.was_evaluated());
        }
    }
}
