//! Entity construction from untyped data.
//!
//! [`Construct::build`] is the ingestion point for typed entities: it
//! allocates a fresh instance, parses the plain table into it and returns it
//! only when every field passed. A partially populated entity is never handed
//! back. `build` is async so it composes with whatever fetched the payload;
//! the pipeline itself never suspends.

use crate::core::entity::{Entity, EntityType, Record};
use crate::core::error::FieldguardResult;
use crate::core::types::Table;
use crate::validation::pipeline::{assert_parsed, parse_into};
use log::debug;
use std::sync::Arc;

/// Build a fully validated entity from a plain table.
#[allow(async_fn_in_trait)]
pub trait Construct: Entity + Default + Sized {
    /// Allocate a default instance and parse `plain` into it.
    ///
    /// Fails with [`FieldguardError::Invalid`](crate::core::error::FieldguardError::Invalid)
    /// when any field is rejected.
    async fn build(plain: &Table) -> FieldguardResult<Self>;
}

impl<T: Entity + Default> Construct for T {
    async fn build(plain: &Table) -> FieldguardResult<Self> {
        let mut instance = T::default();
        debug!("building {}", instance.entity_type().name());
        assert_parsed(parse_into(&mut instance, plain).map(|_| ()))?;
        Ok(instance)
    }
}

impl EntityType {
    /// Build a [`Record`] of this type from a plain table.
    ///
    /// Registered constructors are not consulted; the result is always a
    /// dynamic record.
    pub async fn build(self: &Arc<Self>, plain: &Table) -> FieldguardResult<Record> {
        let mut record = Record::new(Arc::clone(self));
        debug!("building {}", self.name());
        assert_parsed(parse_into(&mut record, plain).map(|_| ()))?;
        Ok(record)
    }
}
