//! Field pipeline implementation.
//!
//! Every participating field runs coerce, then validate, then transform, in
//! the order its entity type declares fields. [`Pipeline::validate`] works in
//! place on an entity; [`Pipeline::parse_into`] works on a staging area and
//! only writes to the target when every field succeeded.

use crate::core::context::FieldContext;
use crate::core::entity::Entity;
use crate::core::error::{FieldguardError, FieldguardResult, ValidationError, ValidationErrors};
use crate::core::metadata::FieldMeta;
use crate::core::types::{Table, Value};
use crate::validation::config::{PipelineConfig, UnknownKeyPolicy};
use indexmap::IndexMap;
use log::{debug, trace};

/// Where a field's value is read from and written back to while it runs.
trait Slots {
    /// The entity phase functions see as the field's owner.
    fn object(&self) -> &dyn Entity;
    fn read(&self, field: &str) -> Value;
    fn write(&mut self, field: &str, value: Value);
}

/// Reads and writes go straight to the entity.
struct InPlace<'e> {
    entity: &'e mut dyn Entity,
}

impl Slots for InPlace<'_> {
    fn object(&self) -> &dyn Entity {
        &*self.entity
    }

    fn read(&self, field: &str) -> Value {
        self.entity.get(field)
    }

    fn write(&mut self, field: &str, value: Value) {
        self.entity.set(field, value);
    }
}

/// Reads and writes go to a staging area; the target is only consulted for
/// metadata.
struct Staged<'t> {
    target: &'t dyn Entity,
    area: IndexMap<String, Value>,
}

impl Slots for Staged<'_> {
    fn object(&self) -> &dyn Entity {
        self.target
    }

    fn read(&self, field: &str) -> Value {
        self.area.get(field).cloned().unwrap_or_default()
    }

    fn write(&mut self, field: &str, value: Value) {
        if value.is_nil() {
            self.area.shift_remove(field);
        } else {
            self.area.insert(field.to_string(), value);
        }
    }
}

/// Run one field through coerce, validate and transform.
///
/// Coercion failure skips the field's rules and transforms; rule failure
/// skips its transforms; the first transform failure stops the rest.
fn run_field<S: Slots>(slots: &mut S, field: &str, meta: &FieldMeta) -> Option<ValidationError> {
    let mut value = slots.read(field);

    if let Some(coercer) = meta.coercer() {
        trace!("coercing '{}' with {}", field, coercer.name());
        let outcome = {
            let ctx = FieldContext::new(slots.object(), field, value.clone());
            coercer.apply(&value, &ctx)
        };
        match outcome {
            Ok(coerced) => {
                slots.write(field, coerced.clone());
                value = coerced;
            }
            Err(message) => return Some(ValidationError::new(field, value, vec![message])),
        }
    }

    if meta.is_optional() && value.is_nil() {
        trace!("skipping absent optional field '{}'", field);
        return None;
    }

    let failures: Vec<String> = {
        let ctx = FieldContext::new(slots.object(), field, value.clone());
        meta.rules()
            .iter()
            .filter_map(|rule| rule.check(&value, &ctx))
            .collect()
    };
    if !failures.is_empty() {
        return Some(ValidationError::new(field, value, failures));
    }

    for transform in meta.transforms() {
        trace!("transforming '{}' with {}", field, transform.name());
        let outcome = {
            let ctx = FieldContext::new(slots.object(), field, value.clone());
            transform.apply(&value, &ctx)
        };
        match outcome {
            Ok(next) => {
                slots.write(field, next.clone());
                value = next;
            }
            Err(message) => return Some(ValidationError::new(field, value, vec![message])),
        }
    }

    None
}

/// Runs the coerce, validate, transform pipeline over entities.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate an entity in place.
    ///
    /// Coerced and transformed values are written back as each step
    /// succeeds. Returns one error per failing field; an empty list means the
    /// entity is valid.
    pub fn validate(&self, entity: &mut dyn Entity) -> Vec<ValidationError> {
        let entity_type = entity.entity_type();
        let mut slots = InPlace { entity };
        let mut errors = Vec::new();

        for (field, meta) in entity_type.participating_fields() {
            if let Some(error) = run_field(&mut slots, field, meta) {
                debug!("{}.{} failed: {}", entity_type.name(), field, error);
                errors.push(error);
            }
        }
        errors
    }

    /// Parse an untyped value bag into `target`, all or nothing.
    ///
    /// Undeclared keys are reported before any field runs. Fields then run
    /// against a staging area; only when every field succeeds are the staged
    /// values copied onto `target`. On failure `target` is unchanged.
    pub fn parse_into<'t, E: Entity>(
        &self,
        target: &'t mut E,
        plain: &Table,
    ) -> Result<&'t mut E, ValidationErrors> {
        let staged = self.stage(&*target, plain)?;
        for (field, value) in staged {
            target.set(&field, value);
        }
        Ok(target)
    }

    fn stage(&self, target: &dyn Entity, plain: &Table) -> Result<IndexMap<String, Value>, ValidationErrors> {
        let entity_type = target.entity_type();
        let mut area = IndexMap::new();
        let mut unknown = Vec::new();

        for (key, value) in plain.entries() {
            match key.as_str() {
                Some(name) if entity_type.declares(name) => {
                    area.insert(name.to_string(), value);
                }
                Some(name) if self.config.unknown_keys == UnknownKeyPolicy::Keep => {
                    area.insert(name.to_string(), value);
                }
                _ => unknown.push(ValidationError::unknown_property(key.to_string(), value)),
            }
        }
        if !unknown.is_empty() {
            debug!(
                "rejected {} undeclared key(s) for {}",
                unknown.len(),
                entity_type.name()
            );
            return Err(self.report(unknown));
        }

        let mut slots = Staged { target, area };
        let mut errors = Vec::new();
        for (field, meta) in entity_type.participating_fields() {
            if let Some(error) = run_field(&mut slots, field, meta) {
                debug!("{}.{} failed: {}", entity_type.name(), field, error);
                errors.push(error);
            }
        }
        if !errors.is_empty() {
            return Err(self.report(errors));
        }

        debug!("committing {} staged field(s) to {}", slots.area.len(), entity_type.name());
        Ok(slots.area)
    }

    /// Validate in place and fail with a rendered report on any error.
    pub fn assert_valid(&self, entity: &mut dyn Entity) -> FieldguardResult<()> {
        let errors = self.validate(entity);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(FieldguardError::Invalid(self.report(errors)))
        }
    }

    /// Unwrap a `parse_into` result, failing with a rendered report.
    pub fn assert_parsed<T>(&self, result: Result<T, ValidationErrors>) -> FieldguardResult<T> {
        result.map_err(|errors| FieldguardError::Invalid(errors.with_indent(self.config.report_indent)))
    }

    fn report(&self, errors: Vec<ValidationError>) -> ValidationErrors {
        ValidationErrors::new(errors).with_indent(self.config.report_indent)
    }
}

/// Validate an entity in place with the default pipeline.
pub fn validate(entity: &mut dyn Entity) -> Vec<ValidationError> {
    Pipeline::default().validate(entity)
}

/// Staged parse with the default pipeline.
pub fn parse_into<'t, E: Entity>(target: &'t mut E, plain: &Table) -> Result<&'t mut E, ValidationErrors> {
    Pipeline::default().parse_into(target, plain)
}

/// [`Pipeline::assert_valid`] with the default pipeline.
pub fn assert_valid(entity: &mut dyn Entity) -> FieldguardResult<()> {
    Pipeline::default().assert_valid(entity)
}

/// [`Pipeline::assert_parsed`] with the default pipeline.
pub fn assert_parsed<T>(result: Result<T, ValidationErrors>) -> FieldguardResult<T> {
    Pipeline::default().assert_parsed(result)
}
