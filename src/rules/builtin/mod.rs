//! Built-in rule families.
//!
//! Organized by phase and kind:
//! - `primitive`: type, bound, literal and pattern checks
//! - `collection`: array, tuple, record, map and set shapes
//! - `combinator`: union, exclusive union, intersection, tag dispatch, nesting
//! - `coerce`: pre-validation conversions
//! - `transform`: post-validation normalizations

pub mod coerce;
pub mod collection;
pub mod combinator;
pub mod primitive;
pub mod transform;
