use serde::{Deserialize, Serialize};

// ─── Schema side ─────────────────────────────────────────────────────────────

/// The declarative definition of one field/question.
///
/// Immutable for the duration of a validation pass; the engine only reads it.
/// The `hidden` flag is precomputed by the schema-processing layer — this
/// crate never decides visibility, it only consumes the flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Stable identifier linking this definition to its response node.
    pub link_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_decimal_places: Option<u32>,
    /// Regex the string form of every answer must fully match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Named constraint expressions, checked at node granularity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,
    /// Child definitions. Consumed only by [`crate::validate_tree`];
    /// per-node validation ignores them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<SchemaNode>,
}

impl SchemaNode {
    /// A minimal node with the given id and everything else unset.
    pub fn new(link_id: impl Into<String>) -> Self {
        SchemaNode {
            link_id: link_id.into(),
            text: None,
            required: false,
            hidden: false,
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            max_decimal_places: None,
            pattern: None,
            constraints: Vec::new(),
            items: Vec::new(),
        }
    }
}

/// A numeric bound: either a literal on the schema or an expression the
/// Expression Evaluator resolves against the live (schema, response) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    Literal(f64),
    Expression(String),
}

/// A named constraint expression declared on a schema node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub key: String,
    pub severity: ConstraintSeverity,
    /// Expression that must evaluate to `true` for the node to pass.
    pub expression: String,
    /// Human-readable message reported when the expression is false.
    pub human: String,
}

/// Constraint severity. Both severities aggregate as failures; the field is
/// data for callers that render messages differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSeverity {
    Error,
    Warning,
}

// ─── Response side ───────────────────────────────────────────────────────────

/// The user-submitted counterpart to a [`SchemaNode`].
///
/// Read-only during a validation pass; the engine neither mutates nor
/// retains it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResponseNode {
    #[serde(default)]
    pub link_id: String,
    /// Answer instances, in submission order. A question answered more than
    /// once carries more than one value.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<AnswerValue>,
    /// Child responses. Consumed only by [`crate::validate_tree`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ResponseNode>,
}

impl ResponseNode {
    /// A node with the given id and no values or children.
    pub fn empty(link_id: impl Into<String>) -> Self {
        ResponseNode {
            link_id: link_id.into(),
            values: Vec::new(),
            items: Vec::new(),
        }
    }

    /// A node with the given id and values.
    pub fn with_values(link_id: impl Into<String>, values: Vec<AnswerValue>) -> Self {
        ResponseNode {
            link_id: link_id.into(),
            values,
            items: Vec::new(),
        }
    }
}

/// One concrete answer instance attached to a [`ResponseNode`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
    /// Calendar date in `YYYY-MM-DD` form.
    Date(String),
    Coded {
        code: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        display: Option<String>,
    },
}

impl AnswerValue {
    /// Whether this value counts as "no answer" for the Required rule.
    /// Only blank text is empty; `false` and `0` are real answers.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// The string representation measured by the length rules and matched
    /// by the pattern rule.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Boolean(b) => b.to_string(),
            AnswerValue::Integer(i) => i.to_string(),
            AnswerValue::Decimal(d) => d.to_string(),
            AnswerValue::Text(s) | AnswerValue::Date(s) => s.clone(),
            AnswerValue::Coded { code, .. } => code.clone(),
        }
    }

    /// Numeric view for the bound rules. Non-numeric values have none.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Integer(i) => Some(*i as f64),
            AnswerValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Fractional digit count of a decimal value, from its shortest
    /// round-trip representation. Non-decimal values have none.
    pub fn decimal_places(&self) -> Option<u32> {
        match self {
            AnswerValue::Decimal(d) => {
                let s = d.to_string();
                Some(match s.split_once('.') {
                    Some((_, frac)) => frac.len() as u32,
                    None => 0,
                })
            }
            _ => None,
        }
    }

    /// JSON view of the value, used when binding answers into an
    /// expression-evaluation context.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AnswerValue::Boolean(b) => serde_json::Value::Bool(*b),
            AnswerValue::Integer(i) => serde_json::Value::Number((*i).into()),
            AnswerValue::Decimal(d) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AnswerValue::Text(s) | AnswerValue::Date(s) => serde_json::Value::String(s.clone()),
            AnswerValue::Coded { code, .. } => serde_json::Value::String(code.clone()),
        }
    }
}
