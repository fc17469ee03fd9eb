//! Value semantics shared by the binding handlers
//!
//! Signals hold [`serde_json::Value`]. These helpers define how such a value
//! is tested for truth, turned into text and written onto a DOM property.

use fos_dom::PropValue;
use serde_json::{Number, Value};

/// Truthiness: `null`, `false`, `0`, `NaN` and `""` are false; every array
/// and object (empty ones included) is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a value as substituted by `${item}`.
///
/// Strings are used raw, arrays are comma-joined (null elements empty) and
/// objects render as compact JSON.
pub fn to_display(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Element count of an array, `None` for anything else
pub fn sequence_len(value: &Value) -> Option<usize> {
    value.as_array().map(Vec::len)
}

/// Convert to a DOM property value; numbers stay numbers
pub fn to_prop(value: &Value) -> PropValue {
    match value {
        Value::Null => PropValue::Null,
        Value::Bool(b) => PropValue::Bool(*b),
        Value::Number(n) => PropValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => PropValue::Str(s.clone()),
        Value::Array(_) | Value::Object(_) => PropValue::Str(to_display(value)),
    }
}

fn number_text(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    PropValue::Number(n.as_f64().unwrap_or(f64::NAN)).to_text()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!(null), false)]
    #[case(json!(false), false)]
    #[case(json!(0), false)]
    #[case(json!(0.0), false)]
    #[case(json!(""), false)]
    #[case(json!(true), true)]
    #[case(json!(-1), true)]
    #[case(json!("0"), true)]
    #[case(json!([]), true)]
    #[case(json!({}), true)]
    fn test_truthiness(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(is_truthy(&value), expected);
    }

    #[rstest]
    #[case(json!("Ada"), "Ada")]
    #[case(json!(3), "3")]
    #[case(json!(3.0), "3")]
    #[case(json!(2.5), "2.5")]
    #[case(json!(true), "true")]
    #[case(json!(null), "null")]
    #[case(json!(["a", null, 1]), "a,,1")]
    #[case(json!({"a": 1}), "{\"a\":1}")]
    fn test_display(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(to_display(&value), expected);
    }

    #[test]
    fn test_to_prop_keeps_scalars() {
        assert_eq!(to_prop(&json!(true)), PropValue::Bool(true));
        assert_eq!(to_prop(&json!(null)), PropValue::Null);
        assert_eq!(to_prop(&json!(7)), PropValue::Number(7.0));
        assert_eq!(to_prop(&json!(-3)), PropValue::Number(-3.0));
        assert_eq!(to_prop(&json!(1.5)), PropValue::Number(1.5));
        assert_eq!(to_prop(&json!(["x", "y"])), PropValue::Str("x,y".into()));
    }

    #[rstest]
    #[case(json!(0), false, "0")]
    #[case(json!(2), true, "2")]
    #[case(json!(0.5), true, "0.5")]
    #[case(json!(null), false, "")]
    #[case(json!("0"), true, "0")]
    fn test_to_prop_coercions(#[case] value: Value, #[case] truthy: bool, #[case] text: &str) {
        let prop = to_prop(&value);
        assert_eq!(prop.is_truthy(), truthy);
        assert_eq!(prop.to_text(), text);
    }

    #[test]
    fn test_sequence_len() {
        assert_eq!(sequence_len(&json!([1, 2])), Some(2));
        assert_eq!(sequence_len(&json!("ab")), None);
    }
}
