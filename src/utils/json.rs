//! Lenient readers for loosely shaped JSON
//!
//! Model replies follow the requested shape only approximately: lists come
//! back as `null`, counts as strings, single items without their list.

use serde_json::Value;

/// Text of a scalar; `null`, arrays and objects read as empty
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// List of strings
///
/// A lone string becomes a one-item list, `null` and missing fields an empty
/// one. Items that are not scalars are dropped.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null() && !v.is_array() && !v.is_object())
            .map(text)
            .collect(),
        Value::String(s) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Finite number, also accepted as a numeric string
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_of_scalars() {
        assert_eq!(text(&json!("급식")), "급식");
        assert_eq!(text(&json!(3)), "3");
        assert_eq!(text(&json!(true)), "true");
        assert_eq!(text(&Value::Null), "");
        assert_eq!(text(&json!({"a": 1})), "");
    }

    #[test]
    fn test_string_list_shapes() {
        assert_eq!(string_list(&json!(["a", null, "b"])), vec!["a", "b"]);
        assert_eq!(string_list(&json!("single")), vec!["single"]);
        assert!(string_list(&Value::Null).is_empty());
        assert!(string_list(&json!({"a": 1})).is_empty());
        assert_eq!(string_list(&json!([1, [2], {"x": 3}])), vec!["1"]);
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        assert_eq!(number(&json!(3)), Some(3.0));
        assert_eq!(number(&json!(2.5)), Some(2.5));
        assert_eq!(number(&json!(" 4 ")), Some(4.0));
        assert_eq!(number(&json!("NaN")), None);
        assert_eq!(number(&json!("many")), None);
        assert_eq!(number(&Value::Null), None);
    }
}
