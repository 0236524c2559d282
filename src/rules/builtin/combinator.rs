//! Rules composed from other schemas.
//!
//! A [`Schema`] is either an entity type (the value must be a table that
//! validates as a fresh instance of that type) or a raw predicate rule.
//! Every combinator treats an absent value as valid so it composes with
//! optional fields.

use crate::core::context::FieldContext;
use crate::core::entity::EntityType;
use crate::core::error::ValidationErrors;
use crate::core::types::Value;
use crate::rules::Rule;
use crate::validation::pipeline::validate;
use indexmap::IndexMap;
use std::sync::Arc;

/// Something a value can be matched against.
#[derive(Debug, Clone)]
pub enum Schema {
    /// Validate as a fresh instance of this entity type
    Entity(Arc<EntityType>),
    /// Run this rule directly
    Predicate(Rule),
}

impl From<Arc<EntityType>> for Schema {
    fn from(entity_type: Arc<EntityType>) -> Self {
        Schema::Entity(entity_type)
    }
}

impl From<&Arc<EntityType>> for Schema {
    fn from(entity_type: &Arc<EntityType>) -> Self {
        Schema::Entity(Arc::clone(entity_type))
    }
}

impl From<Rule> for Schema {
    fn from(rule: Rule) -> Self {
        Schema::Predicate(rule)
    }
}

/// Match a value against a schema. `None` on match, otherwise the reason.
///
/// For entity schemas the value must be a table whose keys are all declared
/// by the type, apart from the names in `allowed_extra`, which are tolerated
/// but not assigned. Unknown keys fail before any field runs.
pub fn match_schema(
    schema: &Schema,
    value: &Value,
    ctx: &FieldContext<'_>,
    allowed_extra: &[&str],
) -> Option<String> {
    let entity_type = match schema {
        Schema::Predicate(rule) => return rule.check(value, ctx),
        Schema::Entity(entity_type) => entity_type,
    };
    let table = match value.as_table() {
        Some(table) => table,
        None => return Some("must be a table".to_string()),
    };

    let mut known = Vec::new();
    let mut unknown = Vec::new();
    for (key, item) in table.entries() {
        match key.as_str() {
            Some(name) if entity_type.declares(name) => known.push((name.to_string(), item)),
            Some(name) if allowed_extra.contains(&name) => {}
            _ => unknown.push(key.to_string()),
        }
    }
    if !unknown.is_empty() {
        unknown.sort();
        return Some(format!("unknown keys: {}", unknown.join(", ")));
    }

    let mut instance = entity_type.instantiate();
    for (name, item) in known {
        instance.set(&name, item);
    }
    let errors = validate(instance.as_mut());
    if errors.is_empty() {
        None
    } else {
        Some(ValidationErrors::new(errors).summary())
    }
}

fn collect<I>(schemas: I) -> Vec<Schema>
where
    I: IntoIterator,
    I::Item: Into<Schema>,
{
    schemas.into_iter().map(Into::into).collect()
}

/// Value must match at least one schema. The first match wins.
///
/// Members may overlap: a pass does not identify a unique member. Use
/// [`exclusive_union`] when exactly one member must match.
pub fn union<I>(schemas: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Schema>,
{
    let schemas = collect(schemas);
    Rule::custom("union", move |value, ctx| {
        if value.is_nil() {
            return None;
        }
        let mut reasons = Vec::new();
        for schema in &schemas {
            match match_schema(schema, value, ctx, &[]) {
                None => return None,
                Some(reason) => reasons.push(reason),
            }
        }
        Some(format!("did not match any member: {}", reasons.join("; ")))
    })
}

/// Value must match exactly one schema. Every schema is tried.
pub fn exclusive_union<I>(schemas: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Schema>,
{
    let schemas = collect(schemas);
    Rule::custom("exclusive_union", move |value, ctx| {
        if value.is_nil() {
            return None;
        }
        let reasons: Vec<String> = schemas
            .iter()
            .filter_map(|schema| match_schema(schema, value, ctx, &[]))
            .collect();
        match schemas.len() - reasons.len() {
            1 => None,
            0 => Some(format!("did not match any member: {}", reasons.join("; "))),
            n => Some(format!("matched {} members, expected exactly one", n)),
        }
    })
}

/// Value must match every schema. Every schema is tried.
pub fn intersect<I>(schemas: I) -> Rule
where
    I: IntoIterator,
    I::Item: Into<Schema>,
{
    let schemas = collect(schemas);
    Rule::custom("intersect", move |value, ctx| {
        if value.is_nil() {
            return None;
        }
        let reasons: Vec<String> = schemas
            .iter()
            .filter_map(|schema| match_schema(schema, value, ctx, &[]))
            .collect();
        if reasons.is_empty() {
            None
        } else {
            Some(format!("did not match every member: {}", reasons.join("; ")))
        }
    })
}

/// Table whose `tag` entry selects the variant schema to match.
///
/// The tag key is tolerated by entity variants even when they do not
/// declare it.
pub fn discriminated_union<I, K, S>(tag: impl Into<String>, variants: I) -> Rule
where
    I: IntoIterator<Item = (K, S)>,
    K: Into<String>,
    S: Into<Schema>,
{
    let tag = tag.into();
    let variants: IndexMap<String, Schema> = variants
        .into_iter()
        .map(|(k, s)| (k.into(), s.into()))
        .collect();

    Rule::custom("discriminated_union", move |value, ctx| {
        if value.is_nil() {
            return None;
        }
        let table = match value.as_table() {
            Some(table) => table,
            None => return Some("must be a table".to_string()),
        };
        let selected = match table.get(tag.as_str()) {
            Value::String(s) => s,
            _ => return Some(format!("discriminator \"{}\" must be a string", tag)),
        };
        match variants.get(&selected) {
            Some(schema) => match_schema(schema, value, ctx, &[tag.as_str()]),
            None => Some(format!(
                "unknown discriminator \"{}\": expected one of {}",
                selected,
                variants.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
            )),
        }
    })
}

/// Table that must validate as an instance of `entity_type`.
///
/// Field-level detail is not surfaced; any failure reads as one message.
pub fn nested(entity_type: Arc<EntityType>) -> Rule {
    let message = format!("must be a valid {}", entity_type.name());
    let schema = Schema::Entity(entity_type);
    Rule::custom("nested", move |value, ctx| {
        if value.is_nil() {
            return None;
        }
        if value.as_table().is_none() {
            return Some("must be a table".to_string());
        }
        match_schema(&schema, value, ctx, &[]).map(|_| message.clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Table;
    use crate::rules::testing::check;
    use crate::rules::{coerce, literal, number, string};
    use serde_json::json;

    fn table(json: serde_json::Value) -> Table {
        Table::try_from(json).unwrap()
    }

    fn greeting() -> Arc<EntityType> {
        EntityType::builder("Greeting")
            .field("x", |f| f.rule(string()))
            .build()
    }

    fn shout() -> Arc<EntityType> {
        EntityType::builder("Shout")
            .field("x", |f| f.rule(string()).rule(crate::rules::min_length(1)))
            .build()
    }

    fn point() -> Arc<EntityType> {
        EntityType::builder("Point")
            .field("px", |f| f.rule(number()))
            .field("py", |f| f.rule(number()))
            .build()
    }

    #[test]
    fn test_match_schema_rejects_unknown_keys_sorted() {
        let record = crate::rules::testing::scratch();
        let ctx = FieldContext::new(&record, "field", Value::Nil);
        let value = Value::Table(table(json!({"x": "hi", "zeta": 1, "alpha": 2})));
        assert_eq!(
            match_schema(&greeting().into(), &value, &ctx, &[]),
            Some("unknown keys: alpha, zeta".into())
        );
        assert_eq!(match_schema(&greeting().into(), &Value::from(1), &ctx, &[]), Some("must be a table".into()));
    }

    #[test]
    fn test_match_schema_runs_full_pipeline_on_fresh_instance() {
        let coerced = EntityType::builder("Count")
            .field("n", |f| f.coerce(coerce::number()).rule(number()))
            .build();
        let record = crate::rules::testing::scratch();
        let ctx = FieldContext::new(&record, "field", Value::Nil);

        let value = Value::Table(table(json!({"n": "12"})));
        assert_eq!(match_schema(&coerced.clone().into(), &value, &ctx, &[]), None);
        // The candidate table itself is left untouched.
        assert_eq!(value.as_table().unwrap().get("n"), Value::from("12"));

        let bad = Value::Table(table(json!({"n": "abc"})));
        assert_eq!(
            match_schema(&coerced.into(), &bad, &ctx, &[]),
            Some(r#"n: cannot coerce "abc" to number"#.into())
        );
    }

    #[test]
    fn test_union_first_match_wins_and_collects_reasons() {
        let rule = union([Schema::from(point()), Schema::from(string())]);
        assert_eq!(check(&rule, table(json!({"px": 1, "py": 2}))), None);
        assert_eq!(check(&rule, "hello"), None);
        assert_eq!(check(&rule, Value::Nil), None);
        assert_eq!(
            check(&rule, 5),
            Some("did not match any member: must be a table; must be a string".into())
        );
    }

    #[test]
    fn test_exclusive_union_requires_exactly_one() {
        let overlapping = exclusive_union([greeting(), shout()]);
        assert_eq!(
            check(&overlapping, table(json!({"x": "hi"}))),
            Some("matched 2 members, expected exactly one".into())
        );

        let disjoint = exclusive_union([greeting(), point()]);
        assert_eq!(check(&disjoint, table(json!({"x": "hi"}))), None);
        assert!(check(&disjoint, table(json!({"q": 1})))
            .unwrap()
            .starts_with("did not match any member: unknown keys: q"));
    }

    #[test]
    fn test_intersect_requires_all() {
        let rule = intersect([Schema::from(string()), Schema::from(crate::rules::min_length(3))]);
        assert_eq!(check(&rule, "abcd"), None);
        assert_eq!(
            check(&rule, 7),
            Some("did not match every member: must be a string; must be a string or array".into())
        );
    }

    #[test]
    fn test_discriminated_union_dispatches_on_tag() {
        let circle = EntityType::builder("Circle")
            .field("radius", |f| f.rule(number()))
            .build();
        let square = EntityType::builder("Square")
            .field("kind", |f| f.rule(literal(["b"])))
            .field("side", |f| f.rule(number()))
            .build();
        let rule = discriminated_union("kind", [("a", circle), ("b", square)]);

        assert_eq!(check(&rule, table(json!({"kind": "a", "radius": 2}))), None);
        assert_eq!(check(&rule, table(json!({"kind": "b", "side": 3}))), None);
        assert_eq!(
            check(&rule, table(json!({"kind": "a", "extraField": 1}))),
            Some("unknown keys: extraField".into())
        );
        assert_eq!(
            check(&rule, table(json!({"kind": "c"}))),
            Some(r#"unknown discriminator "c": expected one of a, b"#.into())
        );
        assert_eq!(
            check(&rule, table(json!({"kind": 1}))),
            Some(r#"discriminator "kind" must be a string"#.into())
        );
        assert_eq!(check(&rule, "a"), Some("must be a table".into()));
    }

    #[test]
    fn test_nested_collapses_errors() {
        let rule = nested(point());
        assert_eq!(check(&rule, table(json!({"px": 1, "py": 2}))), None);
        assert_eq!(check(&rule, table(json!({"px": "1"}))), Some("must be a valid Point".into()));
        assert_eq!(check(&rule, table(json!({"other": 1}))), Some("must be a valid Point".into()));
        assert_eq!(check(&rule, 3), Some("must be a table".into()));
        assert_eq!(check(&rule, Value::Nil), None);
    }
}
