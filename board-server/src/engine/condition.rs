//! Conditional-update gate.
//!
//! Hosts can gate scheduled fetches behind a boolean-valued expression
//! (for example "only refresh while somebody is home"). The engine is
//! agnostic to the expression syntax: it consumes a pluggable predicate
//! and coerces whatever comes back into a boolean. Evaluation errors are
//! non-fatal and fail open, so a broken expression can never permanently
//! stall updates.

use serde_json::Value;

/// Error from evaluating an update predicate.
#[derive(Debug, Clone, thiserror::Error)]
#[error("condition evaluation failed: {0}")]
pub struct ConditionError(pub String);

/// A pluggable predicate gating a scheduled fetch.
pub trait UpdatePredicate: Send + Sync {
    /// Evaluate against current host context.
    ///
    /// The result is coerced with [`coerce_to_bool`]; it does not have
    /// to be a JSON boolean.
    fn evaluate(&self) -> Result<Value, ConditionError>;
}

impl<F> UpdatePredicate for F
where
    F: Fn() -> Result<Value, ConditionError> + Send + Sync,
{
    fn evaluate(&self) -> Result<Value, ConditionError> {
        self()
    }
}

/// Predicate over a fixed configuration string.
///
/// Hosts that carry the condition as plain text (rather than wiring in
/// an evaluator) get the documented string coercion: only a
/// case-insensitive `"true"` updates.
#[derive(Debug, Clone)]
pub struct LiteralCondition(pub String);

impl UpdatePredicate for LiteralCondition {
    fn evaluate(&self) -> Result<Value, ConditionError> {
        Ok(Value::String(self.0.clone()))
    }
}

/// Coerce a predicate result to a boolean.
///
/// Booleans pass through; strings compare case-insensitively against
/// `"true"`; everything else falls back to truthiness (non-zero,
/// non-empty).
pub fn coerce_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
        Value::Null => false,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn booleans_pass_through() {
        assert!(coerce_to_bool(&json!(true)));
        assert!(!coerce_to_bool(&json!(false)));
    }

    #[test]
    fn strings_compare_against_true() {
        assert!(coerce_to_bool(&json!("true")));
        assert!(coerce_to_bool(&json!("TRUE")));
        assert!(coerce_to_bool(&json!(" True ")));
        assert!(!coerce_to_bool(&json!("false")));
        assert!(!coerce_to_bool(&json!("yes")));
        assert!(!coerce_to_bool(&json!("")));
    }

    #[test]
    fn other_values_use_truthiness() {
        assert!(!coerce_to_bool(&json!(null)));
        assert!(coerce_to_bool(&json!(1)));
        assert!(!coerce_to_bool(&json!(0)));
        assert!(coerce_to_bool(&json!(0.5)));
        assert!(coerce_to_bool(&json!([1])));
        assert!(!coerce_to_bool(&json!([])));
        assert!(coerce_to_bool(&json!({"k": 1})));
        assert!(!coerce_to_bool(&json!({})));
    }

    #[test]
    fn closures_are_predicates() {
        let predicate = || Ok(json!(true));
        assert!(coerce_to_bool(&predicate.evaluate().unwrap()));
    }

    #[test]
    fn literal_condition_coerces_as_string() {
        assert!(coerce_to_bool(
            &LiteralCondition("true".into()).evaluate().unwrap()
        ));
        assert!(!coerce_to_bool(
            &LiteralCondition("1 == 1".into()).evaluate().unwrap()
        ));
    }
}
