//! Pre-validation conversions.
//!
//! Every built-in coercer leaves an absent value absent, except
//! [`default_value`] and [`default_with`] on optional fields.

use crate::core::types::Value;
use crate::rules::Coercer;
use std::sync::Arc;

/// Strings pass through; numbers and booleans are stringified.
///
/// Numbers render with 14 significant digits, switching to exponent form
/// outside `1e-4..1e14` (`0.1 + 0.2` gives `"0.3"`, `1e21` gives `"1e+21"`).
pub fn string() -> Coercer {
    Coercer::custom("string", |value, _| match value {
        Value::Nil | Value::String(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::String(format_number(*n))),
        Value::Boolean(b) => Ok(Value::String(b.to_string())),
        Value::Table(_) => Err("cannot coerce table to string".to_string()),
    })
}

/// Numbers pass through; strings are trimmed and parsed.
pub fn number() -> Coercer {
    Coercer::custom("number", |value, _| match value {
        Value::Nil | Value::Number(_) => Ok(value.clone()),
        Value::String(s) => parse_number(s.trim())
            .map(Value::Number)
            .ok_or_else(|| format!("cannot coerce {} to number", value)),
        other => Err(format!("cannot coerce {} to number", other.type_name())),
    })
}

/// `%.14g`-style formatting.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:.13e}", n);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return scientific,
    };

    if (-4..14).contains(&exponent) {
        let fixed = format!("{:.*}", (13 - exponent) as usize, n);
        trim_fraction(&fixed).to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let (negative, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let magnitude = i64::from_str_radix(hex, 16).ok()? as f64;
        return Some(if negative { -magnitude } else { magnitude });
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Booleans pass through; `"true"`/`"1"` and `"false"`/`"0"` are parsed,
/// ignoring case and surrounding whitespace.
pub fn boolean() -> Coercer {
    Coercer::custom("boolean", |value, _| match value {
        Value::Nil | Value::Boolean(_) => Ok(value.clone()),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(Value::Boolean(true)),
            "false" | "0" => Ok(Value::Boolean(false)),
            _ => Err(format!("cannot coerce {} to boolean", value)),
        },
        other => Err(format!("cannot coerce {} to boolean", other.type_name())),
    })
}

/// Fill an absent optional field with a fixed value.
///
/// Required fields and present values pass through unchanged. A table
/// default is shared by every instance that receives it; use
/// [`default_with`] for a fresh table per call.
pub fn default_value(default: impl Into<Value>) -> Coercer {
    let default = default.into();
    defaulting(Arc::new(move || default.clone()))
}

/// Fill an absent optional field with the result of `factory`, invoked once
/// per coercion.
pub fn default_with<F>(factory: F) -> Coercer
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    defaulting(Arc::new(factory))
}

fn defaulting(produce: Arc<dyn Fn() -> Value + Send + Sync>) -> Coercer {
    Coercer::custom("default", move |value, ctx| {
        // Read at call time: the optional marker may be registered after
        // the coercer.
        if value.is_nil() && ctx.is_optional() {
            Ok(produce())
        } else {
            Ok(value.clone())
        }
    })
}

/// Deep-freeze a table so neither it nor any table reachable from it can be
/// modified afterwards. Non-table values are rejected.
pub fn readonly() -> Coercer {
    Coercer::custom("readonly", |value, _| match value {
        Value::Nil => Ok(Value::Nil),
        Value::Table(table) => {
            table.deep_freeze();
            Ok(value.clone())
        }
        other => Err(format!("cannot freeze {}: must be a table", other.type_name())),
    })
}
