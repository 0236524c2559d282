//! Type, bound, literal and pattern checks.

use crate::core::types::Value;
use crate::rules::Rule;
use regex::Regex;

fn fail_unless(ok: bool, message: impl FnOnce() -> String) -> Option<String> {
    if ok {
        None
    } else {
        Some(message())
    }
}

/// Value must be a string.
pub fn string() -> Rule {
    Rule::custom("string", |value, _| {
        fail_unless(matches!(value, Value::String(_)), || "must be a string".to_string())
    })
}

/// Value must be a number.
pub fn number() -> Rule {
    Rule::custom("number", |value, _| {
        fail_unless(matches!(value, Value::Number(_)), || "must be a number".to_string())
    })
}

/// Value must be a number with no fractional part.
pub fn integer() -> Rule {
    Rule::custom("integer", |value, _| {
        fail_unless(
            matches!(value, Value::Number(n) if n.floor() == *n),
            || "must be an integer".to_string(),
        )
    })
}

/// Value must be a boolean.
pub fn boolean() -> Rule {
    Rule::custom("boolean", |value, _| {
        fail_unless(matches!(value, Value::Boolean(_)), || "must be a boolean".to_string())
    })
}

/// Number must be `>= min`.
pub fn min(min: f64) -> Rule {
    Rule::custom("min", move |value, _| match value {
        Value::Number(n) => fail_unless(*n >= min, || format!("must be >= {}", min)),
        _ => Some("must be a number".to_string()),
    })
}

/// Number must be `<= max`.
pub fn max(max: f64) -> Rule {
    Rule::custom("max", move |value, _| match value {
        Value::Number(n) => fail_unless(*n <= max, || format!("must be <= {}", max)),
        _ => Some("must be a number".to_string()),
    })
}

/// Length of a string (in characters) or of an array-like table.
fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Table(t) if t.is_array() => Some(t.len()),
        _ => None,
    }
}

/// String or array length must be `>= min`.
pub fn min_length(min: usize) -> Rule {
    Rule::custom("min_length", move |value, _| match length_of(value) {
        Some(len) => fail_unless(len >= min, || format!("length must be >= {}", min)),
        None => Some("must be a string or array".to_string()),
    })
}

/// String or array length must be `<= max`.
pub fn max_length(max: usize) -> Rule {
    Rule::custom("max_length", move |value, _| match length_of(value) {
        Some(len) => fail_unless(len <= max, || format!("length must be <= {}", max)),
        None => Some("must be a string or array".to_string()),
    })
}

/// String or table must have at least one character or entry.
pub fn not_empty() -> Rule {
    Rule::custom("not_empty", |value, _| {
        let empty = match value {
            Value::Nil => true,
            Value::String(s) => s.is_empty(),
            Value::Table(t) => t.is_empty(),
            _ => false,
        };
        fail_unless(!empty, || "must not be empty".to_string())
    })
}

/// Value must strictly equal one of the allowed scalars.
///
/// Equality is by type and value: the string `"1"` never matches the
/// number `1`.
pub fn literal<I, V>(allowed: I) -> Rule
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let allowed: Vec<Value> = allowed.into_iter().map(Into::into).collect();
    let rendered = allowed
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let message = if allowed.len() == 1 {
        format!("must be {}", rendered)
    } else {
        format!("must be one of {}", rendered)
    };

    Rule::custom("literal", move |value, _| {
        fail_unless(allowed.iter().any(|a| a == value), || message.clone())
    })
}

/// String must match a regular expression.
pub fn pattern(re: &str) -> Result<Rule, regex::Error> {
    let regex = Regex::new(re)?;
    Ok(Rule::custom("pattern", move |value, _| match value {
        Value::String(s) => {
            fail_unless(regex.is_match(s), || format!("must match pattern {}", regex.as_str()))
        }
        _ => Some("must be a string".to_string()),
    }))
}

/// String must match a template such as `"user-${int}"`.
///
/// Placeholders: `${string}`, `${number}`, `${int}`, `${boolean}`. Everything
/// else is literal text. The template is compiled to an anchored pattern once,
/// when the rule is created.
pub fn template_literal(template: &str) -> Result<Rule, regex::Error> {
    let regex = compile_template(template)?;
    let message = format!("must match template \"{}\"", template);
    Ok(Rule::custom("template_literal", move |value, _| match value {
        Value::String(s) => fail_unless(regex.is_match(s), || message.clone()),
        _ => Some("must be a string".to_string()),
    }))
}

fn placeholder(name: &str) -> Option<&'static str> {
    match name {
        "string" => Some(r"(?s:.*)"),
        "number" => Some(r"[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?"),
        "int" => Some(r"[+-]?\d+"),
        "boolean" => Some(r"(?:true|false)"),
        _ => None,
    }
}

fn compile_template(template: &str) -> Result<Regex, regex::Error> {
    let mut pattern = String::from(r"\A");
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        pattern.push_str(&regex::escape(&rest[..start]));
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                match placeholder(&after[..end]) {
                    Some(p) => pattern.push_str(p),
                    // Unknown placeholders are literal text.
                    None => pattern.push_str(&regex::escape(&rest[start..start + end + 3])),
                }
                rest = &after[end + 1..];
            }
            None => {
                pattern.push_str(&regex::escape(&rest[start..]));
                rest = "";
            }
        }
    }

    pattern.push_str(&regex::escape(rest));
    pattern.push_str(r"\z");
    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Table;
    use crate::rules::testing::check;

    #[test]
    fn test_type_checks() {
        assert_eq!(check(&string(), "a"), None);
        assert_eq!(check(&string(), 1), Some("must be a string".into()));
        assert_eq!(check(&number(), 1.5), None);
        assert_eq!(check(&number(), "1"), Some("must be a number".into()));
        assert_eq!(check(&boolean(), false), None);
        assert_eq!(check(&boolean(), Value::Nil), Some("must be a boolean".into()));
    }

    #[test]
    fn test_integer_requires_whole_number() {
        assert_eq!(check(&integer(), 3), None);
        assert_eq!(check(&integer(), -3.0), None);
        assert_eq!(check(&integer(), 3.5), Some("must be an integer".into()));
        assert_eq!(check(&integer(), f64::NAN), Some("must be an integer".into()));
        assert_eq!(check(&integer(), "3"), Some("must be an integer".into()));
    }

    #[test]
    fn test_bounds_are_inclusive_and_type_checked() {
        assert_eq!(check(&min(10.0), 10), None);
        assert_eq!(check(&min(10.0), 9), Some("must be >= 10".into()));
        assert_eq!(check(&min(10.0), "10"), Some("must be a number".into()));
        assert_eq!(check(&max(2.5), 2.5), None);
        assert_eq!(check(&max(2.5), 3), Some("must be <= 2.5".into()));
    }

    #[test]
    fn test_length_bounds() {
        assert_eq!(check(&min_length(2), "ab"), None);
        assert_eq!(check(&min_length(2), "é"), Some("length must be >= 2".into()));
        assert_eq!(check(&max_length(2), Table::from_seq([1, 2])), None);
        assert_eq!(check(&max_length(1), Table::from_seq([1, 2])), Some("length must be <= 1".into()));
        assert_eq!(check(&min_length(0), 5), Some("must be a string or array".into()));
        assert_eq!(
            check(&min_length(0), Table::from_pairs([("a", 1)])),
            Some("must be a string or array".into())
        );
    }

    #[test]
    fn test_not_empty() {
        assert_eq!(check(&not_empty(), "x"), None);
        assert_eq!(check(&not_empty(), ""), Some("must not be empty".into()));
        assert_eq!(check(&not_empty(), Table::new()), Some("must not be empty".into()));
    }

    #[test]
    fn test_literal_is_strict_and_phrases_messages() {
        let one = literal(["admin"]);
        assert_eq!(check(&one, "admin"), None);
        assert_eq!(check(&one, "user"), Some(r#"must be "admin""#.into()));

        let many = literal([Value::from("a"), Value::from(1), Value::from(true)]);
        assert_eq!(check(&many, 1), None);
        assert_eq!(check(&many, true), None);
        assert_eq!(check(&many, "1"), Some(r#"must be one of "a", 1, true"#.into()));
    }

    #[test]
    fn test_pattern() {
        let rule = pattern(r"^\d{3}$").unwrap();
        assert_eq!(check(&rule, "123"), None);
        assert!(check(&rule, "12a").unwrap().starts_with("must match pattern"));
        assert_eq!(check(&rule, 123), Some("must be a string".into()));
        assert!(pattern("(").is_err());
    }

    #[test]
    fn test_template_literal_placeholders() {
        let rule = template_literal("user-${int}").unwrap();
        assert_eq!(check(&rule, "user-42"), None);
        assert_eq!(check(&rule, "user--1"), None);
        assert!(check(&rule, "user-4.2").is_some());
        assert!(check(&rule, "xuser-42").is_some());
        assert!(check(&rule, "user-42x").is_some());

        let px = template_literal("${number}px").unwrap();
        assert_eq!(check(&px, "1.5px"), None);
        assert_eq!(check(&px, "-2e3px"), None);
        assert!(check(&px, "px").is_some());

        let flag = template_literal("${boolean}:${string}").unwrap();
        assert_eq!(check(&flag, "true:anything at all"), None);
        assert_eq!(check(&flag, "false:"), None);
        assert!(check(&flag, "yes:x").is_some());
    }

    #[test]
    fn test_template_literal_escapes_literal_text() {
        let rule = template_literal("a+b.${int}").unwrap();
        assert_eq!(check(&rule, "a+b.1"), None);
        assert!(check(&rule, "aab.1").is_some());
        assert!(check(&rule, "a+bx1").is_some());

        let unknown = template_literal("${word}").unwrap();
        assert_eq!(check(&unknown, "${word}"), None);
        assert_eq!(
            check(&unknown, "hello"),
            Some(r#"must match template "${word}""#.into())
        );
    }
}
