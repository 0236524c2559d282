//! Field execution context.
//!
//! A context is built fresh for every phase of every field and handed to
//! coercers, rules and transforms. It carries the owning entity (so phase
//! functions can look up metadata by instance) and the field's current value.

use crate::core::entity::{Entity, EntityType};
use crate::core::metadata::MetadataStore;
use crate::core::types::Value;
use std::fmt;
use std::sync::Arc;

/// Context provided to every phase function.
pub struct FieldContext<'a> {
    /// The entity that owns the field. During a staged parse this is the
    /// parse target, not the staging area.
    pub object: &'a dyn Entity,
    /// Name of the field being processed.
    pub field: &'a str,
    /// The field's current value.
    pub value: Value,
}

impl<'a> FieldContext<'a> {
    /// Create a new context.
    pub fn new(object: &'a dyn Entity, field: &'a str, value: Value) -> Self {
        Self {
            object,
            field,
            value,
        }
    }

    /// The owning entity's type.
    pub fn entity_type(&self) -> Arc<EntityType> {
        self.object.entity_type()
    }

    /// Whether the field is marked optional in the metadata store.
    pub fn is_optional(&self) -> bool {
        self.entity_type().is_optional(self.field)
    }
}

impl fmt::Debug for FieldContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldContext")
            .field("entity", &self.object.entity_type().name())
            .field("field", &self.field)
            .field("value", &self.value)
            .finish()
    }
}
