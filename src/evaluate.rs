//! The expression-evaluation boundary.
//!
//! The engine treats expression evaluation as an external, potentially
//! suspending collaborator: rules that need a dynamically computed condition
//! or bound call through [`ExpressionScope`], which binds the evaluator to
//! the (schema, response) pair under validation. A CEL-backed implementation
//! ships behind the `cel-eval` feature; hosts with their own expression
//! language implement [`ExpressionEvaluator`] themselves.

use crate::error::{EvaluationError, EvaluationErrorKind};
use crate::types::{ResponseNode, SchemaNode};
use serde_json::Value;

// ─── Evaluator contract ──────────────────────────────────────────────────────

/// Extension point for evaluating an expression string against the live
/// document pair.
///
/// Evaluation may suspend (the evaluator may traverse the document tree or
/// call an external engine) and may fail with [`EvaluationError`] when the
/// expression is malformed or references a non-existent field. Failures are
/// schema-authoring defects and propagate out of the validation pass.
pub trait ExpressionEvaluator {
    /// Evaluates `expression` against the given schema/response pair,
    /// producing a typed value.
    fn evaluate(
        &self,
        schema: &SchemaNode,
        response: &ResponseNode,
        expression: &str,
    ) -> impl Future<Output = Result<Value, EvaluationError>>;
}

// ─── Scope handed to rules ───────────────────────────────────────────────────

/// An [`ExpressionEvaluator`] bound to one (schema, response) pair.
///
/// This is the capability object rules receive: it makes the suspension
/// point visible in the rule's own signature instead of hiding it inside a
/// captured closure, and it centralizes the type checks on results.
pub struct ExpressionScope<'a, E> {
    schema: &'a SchemaNode,
    response: &'a ResponseNode,
    evaluator: &'a E,
}

impl<'a, E: ExpressionEvaluator> ExpressionScope<'a, E> {
    pub fn new(schema: &'a SchemaNode, response: &'a ResponseNode, evaluator: &'a E) -> Self {
        ExpressionScope {
            schema,
            response,
            evaluator,
        }
    }

    /// Raw evaluation, no type expectation.
    pub async fn value(&self, expression: &str) -> Result<Value, EvaluationError> {
        self.evaluator
            .evaluate(self.schema, self.response, expression)
            .await
    }

    /// Evaluation that must produce a boolean (constraint conditions).
    pub async fn boolean(&self, expression: &str) -> Result<bool, EvaluationError> {
        match self.value(expression).await? {
            Value::Bool(b) => Ok(b),
            other => Err(EvaluationError::new(
                EvaluationErrorKind::TypeError,
                format!("expression produced non-boolean result: {}", other),
            )
            .with_expression(expression)),
        }
    }

    /// Evaluation that must produce a number (expression-derived bounds).
    pub async fn number(&self, expression: &str) -> Result<f64, EvaluationError> {
        match self.value(expression).await? {
            Value::Number(n) => n.as_f64().ok_or_else(|| {
                EvaluationError::new(
                    EvaluationErrorKind::TypeError,
                    format!("expression produced non-finite number: {}", n),
                )
                .with_expression(expression)
            }),
            other => Err(EvaluationError::new(
                EvaluationErrorKind::TypeError,
                format!("expression produced non-numeric result: {}", other),
            )
            .with_expression(expression)),
        }
    }
}

// ─── Default CEL evaluator (behind `cel-eval` feature) ──────────────────────

/// Default evaluator backed by the `cel` crate.
///
/// Binds two variables into every evaluation context:
/// - `value` — the first answer attached to the response node, or null;
/// - `values` — all attached answers, as a list.
///
/// An expression referencing an undeclared variable is a schema-authoring
/// defect and fails with kind [`EvaluationErrorKind::Expression`].
#[cfg(feature = "cel-eval")]
pub struct DefaultCelEvaluator;

#[cfg(feature = "cel-eval")]
impl ExpressionEvaluator for DefaultCelEvaluator {
    async fn evaluate(
        &self,
        _schema: &SchemaNode,
        response: &ResponseNode,
        expression: &str,
    ) -> Result<Value, EvaluationError> {
        let program = cel::Program::compile(expression).map_err(|e| {
            EvaluationError::new(
                EvaluationErrorKind::Expression,
                format!("CEL compile error: {}", e),
            )
            .with_expression(expression)
        })?;

        let mut ctx = cel::Context::default();
        let first = response
            .values
            .first()
            .map(|v| v.to_json())
            .unwrap_or(Value::Null);
        let all: Vec<Value> = response.values.iter().map(|v| v.to_json()).collect();
        ctx.add_variable_from_value("value", json_to_cel(&first));
        ctx.add_variable_from_value("values", json_to_cel(&Value::Array(all)));

        match program.execute(&ctx) {
            Ok(result) => Ok(cel_to_json(&result)),
            Err(ref e @ cel::ExecutionError::NotSupportedAsMethod { .. }) => Err(
                EvaluationError::new(
                    EvaluationErrorKind::TypeError,
                    format!("CEL unsupported method: {}", e),
                )
                .with_expression(expression),
            ),
            Err(e) => Err(EvaluationError::new(
                EvaluationErrorKind::Expression,
                format!("CEL execution error: {}", e),
            )
            .with_expression(expression)),
        }
    }
}

#[cfg(feature = "cel-eval")]
fn json_to_cel(value: &Value) -> cel::Value {
    use std::sync::Arc;

    match value {
        Value::Null => cel::Value::Null,
        Value::Bool(b) => cel::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                cel::Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                cel::Value::Float(f)
            } else {
                cel::Value::Null
            }
        }
        Value::String(s) => cel::Value::String(Arc::new(s.clone())),
        Value::Array(items) => {
            cel::Value::List(Arc::new(items.iter().map(json_to_cel).collect()))
        }
        Value::Object(map) => {
            let entries: std::collections::HashMap<String, cel::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_cel(v)))
                .collect();
            entries.into()
        }
    }
}

#[cfg(feature = "cel-eval")]
fn cel_to_json(value: &cel::Value) -> Value {
    match value {
        cel::Value::Null => Value::Null,
        cel::Value::Bool(b) => Value::Bool(*b),
        cel::Value::Int(i) => Value::Number((*i).into()),
        cel::Value::UInt(u) => Value::Number((*u).into()),
        cel::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        cel::Value::String(s) => Value::String(s.to_string()),
        cel::Value::List(items) => Value::Array(items.iter().map(cel_to_json).collect()),
        cel::Value::Map(m) => {
            let mut obj = serde_json::Map::new();
            for (key, val) in m.map.iter() {
                let k = match key {
                    cel::objects::Key::String(s) => s.to_string(),
                    cel::objects::Key::Int(i) => i.to_string(),
                    cel::objects::Key::Uint(u) => u.to_string(),
                    cel::objects::Key::Bool(b) => b.to_string(),
                };
                obj.insert(k, cel_to_json(val));
            }
            Value::Object(obj)
        }
        // Bytes, Duration, Timestamp, Function, Opaque have no JSON mapping
        _ => Value::Null,
    }
}
