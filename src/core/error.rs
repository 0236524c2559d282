//! Error types for fieldguard.
//!
//! Uses thiserror for structured errors with context. Errors are designed to:
//! - Be returned as data by the pipeline and only raised at assert boundaries
//! - Stay field-scoped: one [`ValidationError`] per failing field
//! - Serialize cleanly for adapters that ship reports elsewhere

use crate::core::types::Value;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Top-level error type for fieldguard.
///
/// This enum encompasses all error categories and enables automatic
/// conversion between specific error types.
#[derive(Error, Debug)]
pub enum FieldguardError {
    /// One or more fields failed the pipeline
    #[error("Validation failed:\n{0}")]
    Invalid(ValidationErrors),

    /// A frozen table was written to
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// A single field failed one or more phases.
///
/// `value` is the field's value at the time of failure: the raw value for
/// coercion failures, the coerced value for rule failures, the last
/// successfully transformed value for transform failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{field}: {value} -> {}", .constraints.join(", "))]
pub struct ValidationError {
    /// Name of the failing field.
    pub field: String,
    /// Value observed when the field failed.
    pub value: Value,
    /// Failure messages in rule registration order.
    pub constraints: Vec<String>,
}

impl ValidationError {
    /// Create an error for a field.
    pub fn new(field: impl Into<String>, value: Value, constraints: Vec<String>) -> Self {
        Self {
            field: field.into(),
            value,
            constraints,
        }
    }

    /// Error for a key the target does not declare.
    pub fn unknown_property(key: impl Into<String>, value: Value) -> Self {
        Self::new(key, value, vec!["unknown property".to_string()])
    }

    /// Compact `field: c1, c2` form used inside composite rule messages.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.field, self.constraints.join(", "))
    }
}

/// Ordered list of field errors, rendered as an indented multi-line report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
    #[serde(skip)]
    indent: usize,
}

impl ValidationErrors {
    /// Wrap a list of errors with the default two-space indent.
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors, indent: 2 }
    }

    /// Set the indent used when rendering.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// The individual field errors.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consume into the individual field errors.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Check if there are no errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Find the error for a field, if it failed.
    pub fn field(&self, name: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.field == name)
    }

    /// One-line summary joining every field with `; `.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ValidationError::summary)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = " ".repeat(self.indent);
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}{}", pad, error)?;
        }
        Ok(())
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::new(errors)
    }
}

impl From<ValidationErrors> for FieldguardError {
    fn from(errors: ValidationErrors) -> Self {
        FieldguardError::Invalid(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Errors from table mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Assignment to a frozen table
    #[error("cannot assign key '{key}' of a frozen table")]
    Frozen {
        /// The key that was being assigned
        key: String,
    },
}

/// Errors loading pipeline configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML was malformed or had unexpected values
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for fieldguard operations.
pub type FieldguardResult<T> = Result<T, FieldguardError>;
