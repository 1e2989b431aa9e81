//! Scalar type coercion toward a schema's declared `type`.
//!
//! Request values arrive as strings (path, query, headers, cookies);
//! coercion turns `"5"` into `5` when the schema asks for an integer.
//! Values that cannot be converted are left untouched so evaluation
//! reports the type mismatch.

use serde_json::{Number, Value};

/// Declared types of a schema node, in declaration order.
pub fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Coerce `value` in place to the first declared type it can convert to.
///
/// Returns true if the value was changed.
pub fn coerce_value(value: &mut Value, schema: &Value) -> bool {
    let types = declared_types(schema);
    if types.is_empty() || value.is_null() || types.iter().any(|t| matches_type(value, t)) {
        return false;
    }

    for target in types {
        if let Some(coerced) = convert(value, target) {
            *value = coerced;
            return true;
        }
    }
    false
}

fn matches_type(value: &Value, declared: &str) -> bool {
    match declared {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        _ => false,
    }
}

fn convert(value: &Value, target: &str) -> Option<Value> {
    match (target, value) {
        ("number", Value::String(s)) => parse_number(s.trim()),
        ("number", Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        ("integer", Value::String(s)) => parse_integer(s.trim()),
        ("integer", Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        ("integer", Value::Number(n)) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f as i64)),
        ("boolean", Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ("boolean", Value::Number(n)) => match n.as_f64() {
            Some(f) if f == 1.0 => Some(Value::Bool(true)),
            Some(f) if f == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        ("string", Value::Number(n)) => Some(Value::String(n.to_string())),
        ("string", Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn parse_integer(s: &str) -> Option<Value> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<u64>().ok().map(Value::from)
}

fn parse_number(s: &str) -> Option<Value> {
    if s.is_empty() {
        return None;
    }
    parse_integer(s).or_else(|| {
        s.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
    })
}
