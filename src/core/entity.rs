//! Entity trait and entity type descriptors.
//!
//! An [`EntityType`] is the static configuration table for one kind of
//! entity: its declared fields in order, the metadata record of each field,
//! and how to allocate a fresh instance. It is built once with
//! [`EntityType::builder`] and shared behind an `Arc`.
//!
//! Instances implement [`Entity`]. [`Record`] is the built-in dynamic entity;
//! user structs can implement the trait directly.

use crate::core::metadata::{FieldMeta, MetadataStore};
use crate::core::types::{Table, Value};
use crate::rules::{Coercer, Rule, Transform};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Allocates a fresh, empty instance of an entity type.
pub type Constructor = Arc<dyn Fn() -> Box<dyn Entity> + Send + Sync>;

/// A structured value whose fields the pipeline reads and writes by name.
pub trait Entity {
    /// The type descriptor holding this entity's field metadata.
    fn entity_type(&self) -> Arc<EntityType>;

    /// Read a field. Unset fields read as [`Value::Nil`].
    fn get(&self, field: &str) -> Value;

    /// Write a field.
    fn set(&mut self, field: &str, value: Value);
}

/// Static description of an entity type.
pub struct EntityType {
    name: String,
    fields: IndexMap<String, FieldMeta>,
    constructor: Option<Constructor>,
}

impl EntityType {
    /// Create a new entity type builder.
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder::new(name)
    }

    /// Type name, used in messages and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a field is declared on this type.
    pub fn declares(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Participating fields with their metadata, in declaration order.
    pub fn participating_fields(&self) -> impl Iterator<Item = (&str, &FieldMeta)> {
        self.fields
            .iter()
            .filter(|(_, meta)| meta.participates())
            .map(|(name, meta)| (name.as_str(), meta))
    }

    /// Allocate a fresh instance.
    ///
    /// Uses the registered constructor, or a [`Record`] when none was given.
    pub fn instantiate(self: &Arc<Self>) -> Box<dyn Entity> {
        match &self.constructor {
            Some(constructor) => constructor(),
            None => Box::new(Record::new(Arc::clone(self))),
        }
    }
}

impl MetadataStore for EntityType {
    fn field_meta(&self, field: &str) -> Option<&FieldMeta> {
        self.fields.get(field)
    }

    fn list_fields(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("constructor", &self.constructor.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Builder for EntityType.
pub struct EntityTypeBuilder {
    name: String,
    fields: IndexMap<String, FieldMeta>,
    constructor: Option<Constructor>,
}

impl EntityTypeBuilder {
    /// Create a new builder with the type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            constructor: None,
        }
    }

    /// Declare a field and register its pipeline steps.
    ///
    /// Declaring the same field again continues registration on the existing
    /// record. A field configured with no steps is declared but does not
    /// participate.
    pub fn field<F>(mut self, name: impl Into<String>, configure: F) -> Self
    where
        F: FnOnce(FieldBuilder) -> FieldBuilder,
    {
        let meta = self.fields.entry(name.into()).or_default();
        let builder = FieldBuilder {
            meta: std::mem::take(meta),
        };
        *meta = configure(builder).meta;
        self
    }

    /// Set the constructor used to allocate fresh instances.
    pub fn constructor<F>(mut self, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn Entity> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(constructor));
        self
    }

    /// Build the entity type.
    pub fn build(self) -> Arc<EntityType> {
        Arc::new(EntityType {
            name: self.name,
            fields: self.fields,
            constructor: self.constructor,
        })
    }
}

/// Registers pipeline steps on one field.
pub struct FieldBuilder {
    meta: FieldMeta,
}

impl FieldBuilder {
    /// Append a validation rule.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.meta.push_rule(rule);
        self
    }

    /// Set the coercer, replacing any earlier one.
    pub fn coerce(mut self, coercer: Coercer) -> Self {
        self.meta.set_coercer(coercer);
        self
    }

    /// Append a transform.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.meta.push_transform(transform);
        self
    }

    /// Mark the field optional.
    pub fn optional(mut self) -> Self {
        self.meta.set_optional(true);
        self
    }
}

// ============================================================================
// Record
// ============================================================================

/// Dynamic entity: an ordered map of slots tagged with its type.
#[derive(Clone)]
pub struct Record {
    entity_type: Arc<EntityType>,
    slots: IndexMap<String, Value>,
}

impl Record {
    /// Create an empty record of a type.
    pub fn new(entity_type: Arc<EntityType>) -> Self {
        Self {
            entity_type,
            slots: IndexMap::new(),
        }
    }

    /// Set slots, in their current order.
    pub fn slots(&self) -> &IndexMap<String, Value> {
        &self.slots
    }

    /// Check whether a slot holds a value.
    pub fn is_set(&self, field: &str) -> bool {
        self.slots.contains_key(field)
    }

    /// Copy the slots into a fresh string-keyed table.
    pub fn to_table(&self) -> Table {
        Table::from_pairs(self.slots.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }
}

impl Entity for Record {
    fn entity_type(&self) -> Arc<EntityType> {
        Arc::clone(&self.entity_type)
    }

    fn get(&self, field: &str) -> Value {
        self.slots.get(field).cloned().unwrap_or_default()
    }

    fn set(&mut self, field: &str, value: Value) {
        if value.is_nil() {
            self.slots.shift_remove(field);
        } else {
            self.slots.insert(field.to_string(), value);
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type", &self.entity_type.name())
            .field("slots", &self.slots)
            .finish()
    }
}
