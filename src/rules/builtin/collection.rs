//! Array, tuple, record, map and set shape checks.
//!
//! Every rule first asserts the table shape, then applies its element rules.
//! Array, record, map and set report only the first failing entry; tuple
//! reports every failing slot in one message.

use crate::core::types::{Table, Value};
use crate::rules::Rule;

fn shaped<'v>(value: &'v Value, shape: fn(&Table) -> bool) -> Option<&'v Table> {
    value.as_table().filter(|t| shape(t))
}

/// Value must be an array-like table.
pub fn array() -> Rule {
    Rule::custom("array", |value, _| match shaped(value, Table::is_array) {
        Some(_) => None,
        None => Some("must be an array".to_string()),
    })
}

/// Array whose every element passes `element`.
pub fn array_of(element: Rule) -> Rule {
    Rule::custom("array_of", move |value, ctx| {
        let items = match shaped(value, Table::is_array).and_then(Table::sequence) {
            Some(items) => items,
            None => return Some("must be an array".to_string()),
        };
        items.iter().enumerate().find_map(|(i, item)| {
            element
                .check(item, ctx)
                .map(|message| format!("[{}]: {}", i + 1, message))
        })
    })
}

/// Fixed-length array whose slots pass the given rules, position by position.
///
/// All failing slots are reported, joined with `; `.
pub fn tuple(slots: Vec<Rule>) -> Rule {
    Rule::custom("tuple", move |value, ctx| {
        let items = match shaped(value, Table::is_array).and_then(Table::sequence) {
            Some(items) => items,
            None => return Some("must be an array".to_string()),
        };

        let failures: Vec<String> = (0..items.len().max(slots.len()))
            .filter_map(|i| {
                let message = match slots.get(i) {
                    Some(rule) => rule.check(items.get(i).unwrap_or(&Value::Nil), ctx),
                    None => Some("unexpected element".to_string()),
                };
                message.map(|m| format!("[{}]: {}", i + 1, m))
            })
            .collect();

        if failures.is_empty() {
            None
        } else {
            Some(failures.join("; "))
        }
    })
}

/// Value must be a string-keyed table.
pub fn record() -> Rule {
    Rule::custom("record", |value, _| match shaped(value, Table::is_record) {
        Some(_) => None,
        None => Some("must be a record".to_string()),
    })
}

/// Record whose every value passes `entry`.
pub fn record_of(entry: Rule) -> Rule {
    Rule::custom("record_of", move |value, ctx| {
        let table = match shaped(value, Table::is_record) {
            Some(table) => table,
            None => return Some("must be a record".to_string()),
        };
        table.entries().iter().find_map(|(key, item)| {
            entry
                .check(item, ctx)
                .map(|message| format!("[\"{}\"]: {}", key, message))
        })
    })
}

/// Value must be a non-array table with keys of any type.
pub fn map() -> Rule {
    Rule::custom("map", |value, _| match shaped(value, Table::is_map) {
        Some(_) => None,
        None => Some("must be a map".to_string()),
    })
}

/// Map whose keys pass `key_rule` and values pass `value_rule`.
pub fn map_of(key_rule: Rule, value_rule: Rule) -> Rule {
    Rule::custom("map_of", move |value, ctx| {
        let table = match shaped(value, Table::is_map) {
            Some(table) => table,
            None => return Some("must be a map".to_string()),
        };
        table.entries().iter().find_map(|(key, item)| {
            key_rule
                .check(&key.to_value(), ctx)
                .map(|m| format!("key {}: {}", key, m))
                .or_else(|| value_rule.check(item, ctx).map(|m| format!("[{}]: {}", key, m)))
        })
    })
}

/// Value must be a set: a non-array table whose values are `true` or `1`.
pub fn set() -> Rule {
    Rule::custom("set", |value, _| match shaped(value, Table::is_set) {
        Some(_) => None,
        None => Some("must be a set".to_string()),
    })
}

/// Set whose every member (key) passes `member`.
pub fn set_of(member: Rule) -> Rule {
    Rule::custom("set_of", move |value, ctx| {
        let table = match shaped(value, Table::is_set) {
            Some(table) => table,
            None => return Some("must be a set".to_string()),
        };
        table.keys().iter().find_map(|key| {
            member
                .check(&key.to_value(), ctx)
                .map(|message| format!("member {}: {}", key, message))
        })
    })
}
