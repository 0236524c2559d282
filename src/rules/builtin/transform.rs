//! Post-validation normalizations.

use crate::core::types::{Table, Value};
use crate::rules::Transform;

/// Replace the value with `f(value)`, unconditionally.
pub fn map<F>(f: F) -> Transform
where
    F: Fn(&Value) -> Value + Send + Sync + 'static,
{
    Transform::custom("map", move |value, _| Ok(f(value)))
}

fn string_step(name: &'static str, f: fn(&str) -> String) -> Transform {
    Transform::custom(name, move |value, _| match value {
        Value::Nil => Ok(Value::Nil),
        Value::String(s) => Ok(Value::String(f(s))),
        other => Err(format!("cannot {} {}: must be a string", name, other.type_name())),
    })
}

/// Strip leading and trailing whitespace.
pub fn trim() -> Transform {
    string_step("trim", |s| s.trim().to_string())
}

/// Convert to lowercase.
pub fn lowercase() -> Transform {
    string_step("lowercase", str::to_lowercase)
}

/// Convert to uppercase.
pub fn uppercase() -> Transform {
    string_step("uppercase", str::to_uppercase)
}

/// Map every element of a sequence with `f(element, index)`, 1-based,
/// producing a new sequence of the same length.
///
/// Tables that are not array-like are rejected.
pub fn array_map<F>(f: F) -> Transform
where
    F: Fn(&Value, usize) -> Value + Send + Sync + 'static,
{
    Transform::custom("array_map", move |value, _| match value {
        Value::Nil => Ok(Value::Nil),
        Value::Table(table) => match table.sequence() {
            Some(items) => Ok(Value::Table(Table::from_seq(
                items.iter().enumerate().map(|(i, item)| f(item, i + 1)),
            ))),
            None => Err("cannot map table: must be an array".to_string()),
        },
        other => Err(format!("cannot map {}: must be an array", other.type_name())),
    })
}
