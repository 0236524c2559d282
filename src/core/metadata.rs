//! Field metadata store.
//!
//! Every field of an entity type carries a metadata record: which coercer,
//! rules and transforms were registered for it, whether it is optional, and
//! whether it takes part in the pipeline at all. Records are written while an
//! [`EntityType`](crate::core::entity::EntityType) is being built and are
//! read-only afterwards, so concurrent pipeline calls can share them freely.

use crate::rules::{Coercer, Rule, Transform};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata channels stored per field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Ordered validation rules
    Rules,
    /// The single coercer
    Coercer,
    /// Ordered transforms
    Transforms,
    /// Optional marker
    Optional,
    /// Set once anything was registered for the field
    Participates,
}

/// Metadata record for one field.
#[derive(Clone, Default)]
pub struct FieldMeta {
    participates: bool,
    coercer: Option<Coercer>,
    rules: Vec<Rule>,
    transforms: Vec<Transform>,
    optional: bool,
}

impl FieldMeta {
    /// Whether the pipeline processes this field.
    pub fn participates(&self) -> bool {
        self.participates
    }

    /// The registered coercer, if any.
    pub fn coercer(&self) -> Option<&Coercer> {
        self.coercer.as_ref()
    }

    /// Rules in registration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Transforms in registration order.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Whether an absent value skips validation and transforms.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether anything is stored on a channel.
    pub fn has(&self, channel: Channel) -> bool {
        match channel {
            Channel::Rules => !self.rules.is_empty(),
            Channel::Coercer => self.coercer.is_some(),
            Channel::Transforms => !self.transforms.is_empty(),
            Channel::Optional => self.optional,
            Channel::Participates => self.participates,
        }
    }

    /// Replace the coercer. Later registrations win.
    pub fn set_coercer(&mut self, coercer: Coercer) {
        self.participates = true;
        self.coercer = Some(coercer);
    }

    /// Append a rule.
    pub fn push_rule(&mut self, rule: Rule) {
        self.participates = true;
        self.rules.push(rule);
    }

    /// Append a transform.
    pub fn push_transform(&mut self, transform: Transform) {
        self.participates = true;
        self.transforms.push(transform);
    }

    /// Set the optional marker.
    pub fn set_optional(&mut self, optional: bool) {
        self.participates = true;
        self.optional = optional;
    }
}

impl fmt::Debug for FieldMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMeta")
            .field("participates", &self.participates)
            .field("coercer", &self.coercer.as_ref().map(Coercer::name))
            .field("rules", &self.rules.iter().map(Rule::name).collect::<Vec<_>>())
            .field(
                "transforms",
                &self.transforms.iter().map(Transform::name).collect::<Vec<_>>(),
            )
            .field("optional", &self.optional)
            .finish()
    }
}

/// Read side of the field metadata store.
///
/// Implemented by [`EntityType`](crate::core::entity::EntityType); adapters
/// that keep metadata elsewhere can implement it too.
pub trait MetadataStore {
    /// Metadata for a field, if the field is declared.
    fn field_meta(&self, field: &str) -> Option<&FieldMeta>;

    /// All declared data-bearing slots, in declaration order.
    fn list_fields(&self) -> Vec<&str>;

    /// Whether anything is stored for a field on a channel.
    fn has(&self, channel: Channel, field: &str) -> bool {
        self.field_meta(field).is_some_and(|meta| meta.has(channel))
    }

    /// Whether a field is marked optional.
    fn is_optional(&self, field: &str) -> bool {
        self.has(Channel::Optional, field)
    }

    /// Whether a field takes part in the pipeline.
    fn participates(&self, field: &str) -> bool {
        self.has(Channel::Participates, field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{self, coerce, transform};

    #[test]
    fn test_registration_marks_participation() {
        let mut meta = FieldMeta::default();
        assert!(!meta.participates());
        assert!(!meta.has(Channel::Rules));

        meta.push_rule(rules::string());
        assert!(meta.participates());
        assert!(meta.has(Channel::Rules));
        assert!(!meta.has(Channel::Coercer));
    }

    #[test]
    fn test_coercer_overwrites_and_lists_append() {
        let mut meta = FieldMeta::default();
        meta.set_coercer(coerce::string());
        meta.set_coercer(coerce::number());
        assert_eq!(meta.coercer().map(Coercer::name), Some("number"));

        meta.push_transform(transform::trim());
        meta.push_transform(transform::lowercase());
        let names: Vec<_> = meta.transforms().iter().map(Transform::name).collect();
        assert_eq!(names, vec!["trim", "lowercase"]);
    }

    #[test]
    fn test_optional_marker_alone_participates() {
        let mut meta = FieldMeta::default();
        meta.set_optional(true);
        assert!(meta.is_optional());
        assert!(meta.has(Channel::Participates));
        assert!(format!("{:?}", meta).contains("optional: true"));
    }
}
