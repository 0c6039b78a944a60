//! Translation of query arguments into storage filters.

use docforge_model::{Document, Filter, IDENTITY_FIELD};
use docforge_storage::SUPPORTED_OPERATORS;
use serde_json::Value;

/// Comparison keys a filter input type may declare: exactly what the stores
/// evaluate.
pub const COMPARISON_OPERATORS: [&str; 8] = SUPPORTED_OPERATORS;

pub fn is_supported_operator(operator: &str) -> bool {
    COMPARISON_OPERATORS.contains(&operator)
}

/// The storage engine's spelling of a comparison key: `lt` -> `$lt`.
pub fn operator_syntax(operator: &str) -> String {
    format!("${operator}")
}

/// Builds a storage filter from an arguments mapping.
///
/// Scalars pass through as equality. A nested comparison object keeps its
/// field key and has each operator rewritten, so `{age: {gt: 30}}` becomes
/// `{age: {$gt: 30}}`. Operators are not validated here.
pub fn translate_filter(arguments: &Document) -> Filter {
    arguments
        .iter()
        .map(|(field, value)| (field.clone(), translate_value(value)))
        .collect()
}

fn translate_value(value: &Value) -> Value {
    match value {
        Value::Object(comparisons) => Value::Object(
            comparisons
                .iter()
                .map(|(operator, operand)| (operator_syntax(operator), operand.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Adds mandatory constraints to a filter. Constraints win on conflicting keys.
pub fn merge_constraints(mut filter: Filter, constraints: Filter) -> Filter {
    filter.extend(constraints);
    filter
}

/// `{ _id: id }`
pub fn identity_filter(id: Value) -> Filter {
    let mut filter = Filter::new();
    filter.insert(IDENTITY_FIELD.to_string(), id);
    filter
}
