//! Core types for the fieldguard pipeline.
//!
//! This module contains the foundational pieces the rules and the pipeline
//! engine are built on:
//! - The dynamic value model (scalars and shared tables)
//! - Entity types and their field metadata
//! - The per-step field context
//! - Error types

pub mod context;
pub mod entity;
pub mod error;
pub mod metadata;
pub mod types;

// Re-export commonly used types
pub use context::FieldContext;
pub use entity::{Constructor, Entity, EntityType, EntityTypeBuilder, FieldBuilder, Record};
pub use error::{
    ConfigError, FieldguardError, FieldguardResult, TableError, ValidationError, ValidationErrors,
};
pub use metadata::{Channel, FieldMeta, MetadataStore};
pub use types::{Key, Table, Value};
