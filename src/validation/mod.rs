//! The coerce, validate, transform pipeline.
//!
//! [`validate`] checks an entity in place; [`parse_into`] stages an untyped
//! table and commits it only when every field passes. The assert helpers turn
//! a failed run into one fatal [`FieldguardError`](crate::core::error::FieldguardError).

pub mod config;
pub mod pipeline;

pub use config::{PipelineConfig, UnknownKeyPolicy};
pub use pipeline::{assert_parsed, assert_valid, parse_into, validate, Pipeline};
