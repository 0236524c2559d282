//! # Fieldguard - Declarative Field Pipelines
//!
//! Fieldguard turns untyped value bags into verified entities. Each field of
//! an entity type declares an ordered pipeline: an optional coercer, any
//! number of validation rules and any number of transforms.
//!
//! ## Features
//!
//! - **Declarative fields**: Register coercers, rules and transforms per field with a builder
//! - **Staged parsing**: `parse_into` commits to the target only when every field passes
//! - **Composable rules**: Unions, intersections, tagged unions and collection checks
//! - **Structured errors**: One error per field, rendered as an indented report on demand
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fieldguard::prelude::*;
//!
//! let user = EntityType::builder("User")
//!     .field("name", |f| f.rule(rules::string()).transform(transform::trim()))
//!     .field("age", |f| f.coerce(coerce::number()).rule(rules::integer()).rule(rules::min(0.0)))
//!     .field("nickname", |f| f.optional().rule(rules::string()))
//!     .build();
//!
//! let plain = Table::try_from(serde_json::json!({"name": " Ada ", "age": "36"})).unwrap();
//! let mut record = Record::new(user);
//! parse_into(&mut record, &plain).unwrap();
//! assert_eq!(record.get("name"), Value::from("Ada"));
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`core`]: Value model, entity types, field metadata and errors
//! - [`rules`]: Rule, coercer and transform handles and the built-in factories
//! - [`validation`]: The pipeline engine, its configuration and assert helpers
//! - [`construct`]: Async construction of validated entities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod construct;
pub mod core;
pub mod rules;
pub mod validation;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use fieldguard::prelude::*;
/// ```
pub mod prelude {
    // Values
    pub use crate::core::types::{Key, Table, Value};

    // Entities and metadata
    pub use crate::core::entity::{Entity, EntityType, Record};
    pub use crate::core::metadata::{Channel, FieldMeta, MetadataStore};
    pub use crate::core::context::FieldContext;

    // Errors
    pub use crate::core::error::{
        FieldguardError, FieldguardResult, ValidationError, ValidationErrors,
    };

    // Rules
    pub use crate::rules::{self, coerce, transform, Coercer, Rule, Schema, Transform};

    // Pipeline
    pub use crate::validation::config::{PipelineConfig, UnknownKeyPolicy};
    pub use crate::validation::pipeline::{
        assert_parsed, assert_valid, parse_into, validate, Pipeline,
    };

    // Construction
    pub use crate::construct::Construct;
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use serde_json::json;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn plain(json: serde_json::Value) -> Table {
        Table::try_from(json).unwrap()
    }

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
        assert_eq!(super::NAME, "fieldguard");
    }

    #[test]
    fn test_order_document_end_to_end() {
        init_logging();
        let line = EntityType::builder("Line")
            .field("sku", |f| f.rule(rules::template_literal("SKU-${number}").unwrap()))
            .field("qty", |f| f.coerce(coerce::number()).rule(rules::integer()).rule(rules::min(1.0)))
            .build();
        let order = EntityType::builder("Order")
            .field("id", |f| f.coerce(coerce::string()).rule(rules::not_empty()))
            .field("status", |f| {
                f.optional()
                    .coerce(coerce::default_value("pending"))
                    .rule(rules::literal(["pending", "paid"]))
            })
            .field("lines", |f| {
                f.rule(rules::array_of(rules::nested(line)))
                    .rule(rules::min_length(1))
                    .coerce(coerce::readonly())
            })
            .field("tags", |f| {
                f.optional()
                    .rule(rules::array_of(rules::string()))
                    .transform(transform::array_map(|tag, _| {
                        Value::from(tag.as_str().unwrap_or_default().to_uppercase())
                    }))
            })
            .build();

        let mut record = Record::new(order.clone());
        parse_into(
            &mut record,
            &plain(json!({
                "id": 42,
                "lines": [{"sku": "SKU-7", "qty": "2"}],
                "tags": ["gift"]
            })),
        )
        .unwrap();

        assert_eq!(record.get("id"), Value::from("42"));
        assert_eq!(record.get("status"), Value::from("pending"));
        let tags = record.get("tags");
        assert_eq!(tags.as_table().unwrap().get(1), Value::from("GIFT"));
        assert!(record.get("lines").as_table().unwrap().is_frozen());

        let mut rejected = Record::new(order);
        let errors = parse_into(
            &mut rejected,
            &plain(json!({"id": "", "lines": [{"sku": "ABC", "qty": 0}]})),
        )
        .unwrap_err();
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(
            errors.field("lines").unwrap().constraints,
            vec!["[1]: must be a valid Line".to_string()]
        );
        assert!(rejected.slots().is_empty());
    }

    #[test]
    fn test_discriminated_payloads() {
        let card = EntityType::builder("Card")
            .field("number", |f| f.rule(rules::pattern(r"^\d{16}$").unwrap()))
            .build();
        let bank = EntityType::builder("Bank")
            .field("iban", |f| f.rule(rules::string()).rule(rules::min_length(15)))
            .build();
        let payment = EntityType::builder("Payment")
            .field("method", |f| {
                f.rule(rules::discriminated_union("type", [("card", card), ("bank", bank)]))
            })
            .build();

        let mut ok = Record::new(payment.clone());
        parse_into(
            &mut ok,
            &plain(json!({"method": {"type": "card", "number": "4111111111111111"}})),
        )
        .unwrap();

        let mut bad = Record::new(payment);
        let err = assert_parsed(
            parse_into(&mut bad, &plain(json!({"method": {"type": "cash"}}))).map(|_| ()),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed:\n  method: {\"type\":\"cash\"} -> unknown discriminator \"cash\": expected one of card, bank"
        );
    }
}
