//! Rule, coercer and transform handles plus the built-in factories.
//!
//! Each handle wraps a shared closure so entity types can be cloned and
//! shared across threads. Factories live in [`builtin`]; the validation
//! factories are re-exported here, coercers and transforms under
//! [`coerce`] and [`transform`].

pub mod builtin;

pub use builtin::collection::{
    array, array_of, map, map_of, record, record_of, set, set_of, tuple,
};
pub use builtin::combinator::{
    discriminated_union, exclusive_union, intersect, match_schema, nested, union, Schema,
};
pub use builtin::primitive::{
    boolean, integer, literal, max, max_length, min, min_length, not_empty, number, pattern,
    string, template_literal,
};
pub use builtin::{coerce, transform};

use crate::core::context::FieldContext;
use crate::core::types::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome of a coercer or transform: the replacement value, or one message.
pub type StepResult = Result<Value, String>;

/// Signature of a validation check: `None` passes, `Some(message)` fails.
pub type CheckFn = dyn Fn(&Value, &FieldContext<'_>) -> Option<String> + Send + Sync;

/// Signature of a coercer or transform.
pub type StepFn = dyn Fn(&Value, &FieldContext<'_>) -> StepResult + Send + Sync;

/// A single-field validation check.
#[derive(Clone)]
pub struct Rule {
    name: String,
    check: Arc<CheckFn>,
    message: Option<String>,
}

impl Rule {
    /// Create a rule from a check function.
    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value, &FieldContext<'_>) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
            message: None,
        }
    }

    /// Replace the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Rule name, for debugging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the check.
    pub fn check(&self, value: &Value, ctx: &FieldContext<'_>) -> Option<String> {
        (self.check)(value, ctx).map(|failure| self.message.clone().unwrap_or(failure))
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish()
    }
}

/// A pre-validation conversion.
#[derive(Clone)]
pub struct Coercer {
    name: String,
    step: Arc<StepFn>,
}

impl Coercer {
    /// Create a coercer from a step function.
    pub fn custom<F>(name: impl Into<String>, step: F) -> Self
    where
        F: Fn(&Value, &FieldContext<'_>) -> StepResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            step: Arc::new(step),
        }
    }

    /// Coercer name, for debugging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the coercion.
    pub fn apply(&self, value: &Value, ctx: &FieldContext<'_>) -> StepResult {
        (self.step)(value, ctx)
    }
}

impl fmt::Debug for Coercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Coercer").field(&self.name).finish()
    }
}

/// A post-validation normalization.
#[derive(Clone)]
pub struct Transform {
    name: String,
    step: Arc<StepFn>,
}

impl Transform {
    /// Create a transform from a step function.
    pub fn custom<F>(name: impl Into<String>, step: F) -> Self
    where
        F: Fn(&Value, &FieldContext<'_>) -> StepResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            step: Arc::new(step),
        }
    }

    /// Transform name, for debugging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the transform.
    pub fn apply(&self, value: &Value, ctx: &FieldContext<'_>) -> StepResult {
        (self.step)(value, ctx)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for running rules outside the pipeline.

    use crate::core::context::FieldContext;
    use crate::core::entity::{EntityType, Record};
    use crate::core::types::Value;
    use crate::rules::{Coercer, Rule, StepResult, Transform};

    /// A record whose `field` slot is required.
    pub fn scratch() -> Record {
        Record::new(EntityType::builder("Scratch").field("field", |f| f).build())
    }

    /// Same, with `field` optional.
    pub fn scratch_optional() -> Record {
        Record::new(EntityType::builder("Scratch").field("field", |f| f.optional()).build())
    }

    pub fn check(rule: &Rule, value: impl Into<Value>) -> Option<String> {
        let record = scratch();
        let value = value.into();
        let ctx = FieldContext::new(&record, "field", value.clone());
        rule.check(&value, &ctx)
    }

    pub fn coerce_on(record: &Record, coercer: &Coercer, value: impl Into<Value>) -> StepResult {
        let value = value.into();
        let ctx = FieldContext::new(record, "field", value.clone());
        coercer.apply(&value, &ctx)
    }

    pub fn coerce(coercer: &Coercer, value: impl Into<Value>) -> StepResult {
        coerce_on(&scratch(), coercer, value)
    }

    pub fn apply(transform: &Transform, value: impl Into<Value>) -> StepResult {
        let record = scratch();
        let value = value.into();
        let ctx = FieldContext::new(&record, "field", value.clone());
        transform.apply(&value, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::testing::check;
    use super::*;

    #[test]
    fn test_with_message_overrides_failure_only() {
        let rule = string().with_message("name must be text");
        assert_eq!(check(&rule, 5), Some("name must be text".to_string()));
        assert_eq!(check(&rule, "ok"), None);
    }

    #[test]
    fn test_custom_rule_sees_context() {
        let rule = Rule::custom("field_is_named", |_, ctx| {
            (ctx.field != "field").then(|| format!("unexpected field {}", ctx.field))
        });
        assert_eq!(check(&rule, Value::Nil), None);
        assert_eq!(format!("{:?}", rule), r#"Rule { name: "field_is_named", message: None }"#);
    }
}
