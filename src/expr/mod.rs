//! Expression evaluation against the data record
//!
//! The engine only depends on [`ExpressionEvaluator`]. [`Interpreter`] is the
//! bundled implementation backed by an embedded `rhai` engine in expression
//! mode: no statements, no assignments, no side effects.

mod error;
mod interpreter;

pub use error::EvalError;
pub use interpreter::{Interpreter, MAX_OPERATORS};

use serde_json::Value;

/// Evaluates expression strings against a data record.
///
/// Failures come back as `Err` and are never raised as panics; callers treat
/// them as "no result".
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression` to a value
    fn evaluate_value(&self, expression: &str, data: &Value) -> Result<Value, EvalError>;

    /// Evaluate `expression` as a condition
    fn evaluate_condition(&self, expression: &str, data: &Value) -> Result<bool, EvalError> {
        self.evaluate_value(expression, data)
            .map(|value| truthy(&value))
    }
}

/// JS-style truthiness
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
