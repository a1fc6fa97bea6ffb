//! Built-in scalar coercion.
//!
//! Runtime values are `serde_json::Value`s. Each built-in scalar has three
//! conversions: `serialize` (resolver output to response), `parse_value`
//! (variable input) and `parse_literal` (query literal). Custom scalars
//! pass values through unchanged.

use gqlkit_syntax::{ast, print_value};
use serde_json::{Number, Value as JsonValue};
use thiserror::Error;

use crate::values::value_from_ast_untyped;

/// Names of the built-in scalars.
pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// Returns true for `Int`, `Float`, `String`, `Boolean` and `ID`.
pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

/// A value the scalar cannot represent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ScalarError(pub String);

type ScalarResult = Result<JsonValue, ScalarError>;

/// Converts a resolved value for the response.
pub fn serialize(scalar: &str, value: &JsonValue) -> ScalarResult {
    match scalar {
        "Int" => serialize_int(value),
        "Float" => coerce_float(value),
        "String" => serialize_string(value),
        "Boolean" => serialize_boolean(value),
        "ID" => coerce_id(value),
        _ => Ok(value.clone()),
    }
}

/// Converts a variable value supplied with the request.
pub fn parse_value(scalar: &str, value: &JsonValue) -> ScalarResult {
    match scalar {
        "Int" => match value {
            JsonValue::Number(n) => int_from_number(n, value),
            _ => Err(non_integer(value)),
        },
        "Float" => coerce_float(value),
        "String" => match value {
            JsonValue::String(_) => Ok(value.clone()),
            _ => Err(ScalarError(format!(
                "String cannot represent a non string value: {value}"
            ))),
        },
        "Boolean" => match value {
            JsonValue::Bool(_) => Ok(value.clone()),
            _ => Err(ScalarError(format!(
                "Boolean cannot represent a non boolean value: {value}"
            ))),
        },
        "ID" => coerce_id(value),
        _ => Ok(value.clone()),
    }
}

/// Converts a constant literal from a query document.
pub fn parse_literal(scalar: &str, literal: &ast::Value) -> ScalarResult {
    match (scalar, literal) {
        ("Int", ast::Value::Int(text, _)) => match text.parse::<i64>() {
            Ok(n) => i32::try_from(n).map(JsonValue::from).map_err(|_| {
                ScalarError(format!(
                    "Int cannot represent non 32-bit signed integer value: {text}"
                ))
            }),
            Err(_) => Err(ScalarError(format!(
                "Int cannot represent non 32-bit signed integer value: {text}"
            ))),
        },
        ("Float", ast::Value::Int(text, _) | ast::Value::Float(text, _)) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(JsonValue::Number)
            .ok_or_else(|| ScalarError(format!("Float cannot represent value: {text}"))),
        ("String", ast::Value::String(s)) => Ok(JsonValue::String(s.value.clone())),
        ("Boolean", ast::Value::Boolean(b, _)) => Ok(JsonValue::Bool(*b)),
        ("ID", ast::Value::String(s)) => Ok(JsonValue::String(s.value.clone())),
        ("ID", ast::Value::Int(text, _)) => Ok(JsonValue::String(text.clone())),
        (name, _) if is_builtin_scalar(name) => Err(ScalarError(format!(
            "{name} cannot represent value: {}",
            print_value(literal)
        ))),
        _ => Ok(value_from_ast_untyped(literal, None)),
    }
}

fn non_integer(value: &JsonValue) -> ScalarError {
    ScalarError(format!("Int cannot represent non-integer value: {value}"))
}

#[allow(clippy::cast_possible_truncation)]
fn int_from_number(n: &Number, original: &JsonValue) -> ScalarResult {
    let int = if let Some(i) = n.as_i64() {
        i
    } else {
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.is_finite() => f as i64,
            _ => return Err(non_integer(original)),
        }
    };
    i32::try_from(int).map(JsonValue::from).map_err(|_| {
        ScalarError(format!(
            "Int cannot represent non 32-bit signed integer value: {original}"
        ))
    })
}

fn serialize_int(value: &JsonValue) -> ScalarResult {
    match value {
        JsonValue::Number(n) => int_from_number(n, value),
        JsonValue::Bool(b) => Ok(JsonValue::from(i32::from(*b))),
        JsonValue::String(s) => match s.trim().parse::<f64>() {
            Ok(f) => match Number::from_f64(f) {
                Some(n) => int_from_number(&n, value),
                None => Err(non_integer(value)),
            },
            Err(_) => Err(non_integer(value)),
        },
        _ => Err(non_integer(value)),
    }
}

/// Float accepts integers and numeric strings in every direction.
fn coerce_float(value: &JsonValue) -> ScalarResult {
    let float = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    float
        .and_then(Number::from_f64)
        .map(JsonValue::Number)
        .ok_or_else(|| ScalarError(format!("Float cannot represent non numeric value: {value}")))
}

fn serialize_string(value: &JsonValue) -> ScalarResult {
    match value {
        JsonValue::String(_) => Ok(value.clone()),
        JsonValue::Number(n) => Ok(JsonValue::String(n.to_string())),
        JsonValue::Bool(b) => Ok(JsonValue::String(b.to_string())),
        _ => Err(ScalarError(format!(
            "String cannot represent value: {value}"
        ))),
    }
}

fn serialize_boolean(value: &JsonValue) -> ScalarResult {
    match value {
        JsonValue::Bool(_) => Ok(value.clone()),
        JsonValue::Number(n) => Ok(JsonValue::Bool(n.as_f64().is_some_and(|f| f != 0.0))),
        _ => Err(ScalarError(format!(
            "Boolean cannot represent a non boolean value: {value}"
        ))),
    }
}

fn coerce_id(value: &JsonValue) -> ScalarResult {
    match value {
        JsonValue::String(_) => Ok(value.clone()),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(JsonValue::String(n.to_string())),
        _ => Err(ScalarError(format!("ID cannot represent value: {value}"))),
    }
}
