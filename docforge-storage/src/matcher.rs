//! Filter evaluation shared by every store.

use std::cmp::Ordering;

use docforge_model::{Document, Filter};
use serde_json::{Map, Value};

use crate::{StorageError, StorageResult};

/// Operators understood inside a field's operator object, where each is
/// spelled with a `$` prefix.
pub const SUPPORTED_OPERATORS: [&str; 8] = ["eq", "ne", "lt", "lte", "gt", "gte", "in", "nin"];

/// Whether `document` satisfies every entry of `filter`.
pub fn matches(document: &Document, filter: &Filter) -> StorageResult<bool> {
    for (field, condition) in filter {
        let value = document.get(field).unwrap_or(&Value::Null);
        if !field_matches(value, condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Sets every field of `patch` on `document`.
pub fn apply_patch(document: &mut Document, patch: Document) {
    for (field, value) in patch {
        document.insert(field, value);
    }
}

fn field_matches(value: &Value, condition: &Value) -> StorageResult<bool> {
    match condition {
        Value::Object(operators) if is_operator_object(operators) => {
            for (operator, operand) in operators {
                if !apply_operator(value, operator, operand)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        literal => Ok(equals(value, literal)),
    }
}

fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.keys().all(|key| key.starts_with('$'))
}

fn apply_operator(value: &Value, operator: &str, operand: &Value) -> StorageResult<bool> {
    let unsupported = || StorageError::UnsupportedOperator(operator.to_string());
    let name = operator
        .strip_prefix('$')
        .filter(|name| SUPPORTED_OPERATORS.contains(name))
        .ok_or_else(unsupported)?;
    let matched = match name {
        "eq" => equals(value, operand),
        "ne" => !equals(value, operand),
        "lt" => compares(value, operand, |o| o == Ordering::Less),
        "lte" => compares(value, operand, |o| o != Ordering::Greater),
        "gt" => compares(value, operand, |o| o == Ordering::Greater),
        "gte" => compares(value, operand, |o| o != Ordering::Less),
        "in" => candidates(operator, operand)?
            .iter()
            .any(|candidate| equals(value, candidate)),
        "nin" => !candidates(operator, operand)?
            .iter()
            .any(|candidate| equals(value, candidate)),
        _ => return Err(unsupported()),
    };
    Ok(matched)
}

fn candidates<'a>(operator: &str, operand: &'a Value) -> StorageResult<&'a Vec<Value>> {
    operand
        .as_array()
        .ok_or_else(|| StorageError::InvalidData(format!("{operator} expects an array")))
}

/// Equality with numeric normalization; an array field matches when any item does.
fn equals(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        (Value::Array(items), literal) if !literal.is_array() => {
            items.iter().any(|item| scalar_equals(item, literal))
        }
        (value, literal) => scalar_equals(value, literal),
    }
}

fn scalar_equals(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (a, b) => a == b,
    }
}

fn compares(value: &Value, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Value::Array(items) => items
            .iter()
            .any(|item| ordering(item, operand).is_some_and(&accept)),
        value => ordering(value, operand).is_some_and(accept),
    }
}

/// Only numbers compare with numbers and strings with strings.
fn ordering(value: &Value, operand: &Value) -> Option<Ordering> {
    match (value, operand) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
