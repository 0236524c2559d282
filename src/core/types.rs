//! Core value types that flow through the field pipeline.
//!
//! The type system uses an enum-based approach:
//! - Closed set of types: untyped payloads only ever carry nil, booleans,
//!   numbers, strings and tables
//! - Zero-cost pattern matching for the rule families
//! - Tables are shared handles with identity, so cyclic structures can be
//!   represented and walked with a visited set
//!
//! Tables are untyped key/value collections. Whether a table is a sequence,
//! a record, a map or a set is decided by the shape predicates on [`Table`],
//! not by the representation.

use crate::core::error::TableError;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Core value types accepted by the pipeline.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Represents absence of value
    #[default]
    Nil,
    /// Boolean value
    Boolean(bool),
    /// 64-bit floating point number (integers are numbers with no fraction)
    Number(f64),
    /// UTF-8 string
    String(String),
    /// Shared key/value collection
    Table(Table),
}

/// Key of a table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Integer key; sequences use contiguous keys starting at 1
    Integer(i64),
    /// String key
    String(String),
    /// Boolean key
    Boolean(bool),
}

/// Shared, identity-bearing key/value collection.
///
/// Cloning a `Table` clones the handle, not the contents. Two handles are
/// equal only when they point at the same table.
#[derive(Clone, Default)]
pub struct Table {
    inner: Arc<RwLock<TableData>>,
}

#[derive(Default)]
struct TableData {
    entries: IndexMap<Key, Value>,
    frozen: bool,
}

// ============================================================================
// Value Implementation
// ============================================================================

impl Value {
    /// Check whether this is the absent sentinel.
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Name of this value's runtime type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Table(_) => "table",
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        if let Value::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    /// Try to get this value as a number.
    pub fn as_number(&self) -> Option<f64> {
        if let Value::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Boolean(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    /// Try to get this value as a table handle.
    pub fn as_table(&self) -> Option<&Table> {
        if let Value::Table(t) = self {
            Some(t)
        } else {
            None
        }
    }

    /// Convert to JSON. Cycles are rendered as the string `"<cycle>"`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut path = HashSet::new();
        self.to_json_inner(&mut path)
    }

    fn to_json_inner(&self, path: &mut HashSet<usize>) -> serde_json::Value {
        match self {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Table(table) => {
                if !path.insert(table.id()) {
                    return serde_json::Value::String("<cycle>".to_string());
                }
                let json = match table.sequence() {
                    Some(items) => serde_json::Value::Array(
                        items.iter().map(|v| v.to_json_inner(path)).collect(),
                    ),
                    None => serde_json::Value::Object(
                        table
                            .entries()
                            .into_iter()
                            .map(|(k, v)| (k.to_string(), v.to_json_inner(path)))
                            .collect(),
                    ),
                };
                path.remove(&table.id());
                json
            }
        }
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Nil)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Table(Table::from_seq(items.into_iter().map(Value::from)))
            }
            serde_json::Value::Object(map) => Value::Table(Table::from_pairs(
                map.into_iter().map(|(k, v)| (Key::String(k), Value::from(v))),
            )),
        }
    }
}

// ============================================================================
// Key Implementation
// ============================================================================

impl Key {
    /// Convert the key into a value, e.g. to run a rule against it.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Integer(i) => Value::Number(*i as f64),
            Key::String(s) => Value::String(s.clone()),
            Key::Boolean(b) => Value::Boolean(*b),
        }
    }

    /// Try to get this key as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        if let Key::String(s) = self {
            Some(s)
        } else {
            None
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Integer(i) => write!(f, "{}", i),
            Key::String(s) => write!(f, "{}", s),
            Key::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Integer(i)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Integer(i as i64)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Integer(i as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(s)
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Boolean(b)
    }
}

// ============================================================================
// Table Implementation
// ============================================================================

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sequence table with keys `1..=n`.
    ///
    /// Nil items leave a hole, exactly as writing nil to a key would.
    pub fn from_seq<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let entries = items
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| match v.into() {
                Value::Nil => None,
                v => Some((Key::Integer(i as i64 + 1), v)),
            })
            .collect();
        Self::with_entries(entries)
    }

    /// Create a table from key/value pairs. Nil values are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let entries = pairs
            .into_iter()
            .filter_map(|(k, v)| match v.into() {
                Value::Nil => None,
                v => Some((k.into(), v)),
            })
            .collect();
        Self::with_entries(entries)
    }

    fn with_entries(entries: IndexMap<Key, Value>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(TableData {
                entries,
                frozen: false,
            })),
        }
    }

    /// Identity of the underlying table, stable for its lifetime.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Check whether two handles point at the same table.
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Read an entry. Missing keys read as [`Value::Nil`].
    pub fn get(&self, key: impl Into<Key>) -> Value {
        self.inner
            .read()
            .entries
            .get(&key.into())
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: impl Into<Key>) -> bool {
        self.inner.read().entries.contains_key(&key.into())
    }

    /// Write an entry. Writing nil removes the key.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<(), TableError> {
        let key = key.into();
        let mut data = self.inner.write();
        if data.frozen {
            return Err(TableError::Frozen {
                key: key.to_string(),
            });
        }
        match value.into() {
            Value::Nil => {
                data.entries.shift_remove(&key);
            }
            value => {
                data.entries.insert(key, value);
            }
        }
        Ok(())
    }

    /// Append at the first free integer key after 1, 2, 3, ...
    ///
    /// On a sequence this is `len + 1`. On a sparse table it fills the first
    /// hole, so no existing entry is overwritten.
    pub fn push(&self, value: impl Into<Value>) -> Result<(), TableError> {
        let next = {
            let data = self.inner.read();
            let mut next = 1i64;
            while data.entries.contains_key(&Key::Integer(next)) {
                next += 1;
            }
            next
        };
        self.set(next, value)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Snapshot of the keys in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner.read().entries.keys().cloned().collect()
    }

    /// Snapshot of the entries in insertion order.
    pub fn entries(&self) -> Vec<(Key, Value)> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Elements ordered by index, if this table is array-like.
    pub fn sequence(&self) -> Option<Vec<Value>> {
        if !self.is_array() {
            return None;
        }
        let data = self.inner.read();
        Some(
            (1..=data.entries.len() as i64)
                .map(|i| data.entries.get(&Key::Integer(i)).cloned().unwrap_or_default())
                .collect(),
        )
    }

    /// Whether this table rejects mutation.
    pub fn is_frozen(&self) -> bool {
        self.inner.read().frozen
    }

    /// Freeze this table only. Nested tables stay mutable.
    pub fn freeze(&self) {
        self.inner.write().frozen = true;
    }

    /// Freeze this table and every table reachable from it.
    ///
    /// Walks with an explicit worklist and a visited set keyed on table
    /// identity, so self-referential structures terminate.
    pub fn deep_freeze(&self) {
        let mut visited = HashSet::new();
        let mut pending = vec![self.clone()];

        while let Some(table) = pending.pop() {
            if !visited.insert(table.id()) {
                continue;
            }
            let children: Vec<Table> = {
                let mut data = table.inner.write();
                data.frozen = true;
                data.entries
                    .values()
                    .filter_map(|v| v.as_table().cloned())
                    .collect()
            };
            pending.extend(children);
        }
    }

    // ========================================================================
    // Shape Predicates
    // ========================================================================

    /// Array-like: keys are exactly the integers `1..=len`.
    ///
    /// The empty table is array-like.
    pub fn is_array(&self) -> bool {
        let data = self.inner.read();
        let len = data.entries.len() as i64;
        data.entries
            .keys()
            .all(|k| matches!(k, Key::Integer(i) if *i >= 1 && *i <= len))
    }

    /// Record: not array-like, and every key is a string.
    pub fn is_record(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        !self.is_array()
            && self
                .inner
                .read()
                .entries
                .keys()
                .all(|k| matches!(k, Key::String(_)))
    }

    /// Map: not array-like, keys of any type.
    pub fn is_map(&self) -> bool {
        self.is_empty() || !self.is_array()
    }

    /// Set: not array-like, and every value is `true` or the number `1`.
    pub fn is_set(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        !self.is_array()
            && self
                .inner
                .read()
                .entries
                .values()
                .all(|v| matches!(v, Value::Boolean(true)) || matches!(v, Value::Number(n) if *n == 1.0))
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: contents may be cyclic.
        let data = self.inner.read();
        f.debug_struct("Table")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("len", &data.entries.len())
            .field("frozen", &data.frozen)
            .finish()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl TryFrom<serde_json::Value> for Table {
    type Error = String;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match Value::from(json) {
            Value::Table(t) => Ok(t),
            other => Err(format!("expected a JSON object or array, got {}", other.type_name())),
        }
    }
}
