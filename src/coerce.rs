//! Coercion of evaluated values into a component's declared type

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Semantic type tag carried by a component
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    Text,
    Number,
    Integer,
    Boolean,
    Date,
    DateTime,
    #[default]
    Any,
    /// Unrecognized tag, kept so definitions round-trip unchanged
    Other(String),
}

impl ValueType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Any => "any",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for ValueType {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "text" | "string" => Self::Text,
            "number" | "decimal" => Self::Number,
            "integer" | "int" => Self::Integer,
            "boolean" | "bool" => Self::Boolean,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "any" | "" => Self::Any,
            _ => Self::Other(tag),
        }
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        value_type.as_str().to_string()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert `raw` into the representation used for `value_type`.
///
/// Total: anything that cannot be represented becomes `null`.
pub fn resolve_type(raw: &Value, value_type: &ValueType) -> Value {
    if let Value::String(s) = raw {
        if s.trim().is_empty() && *value_type != ValueType::Any {
            return Value::Null;
        }
    }

    match value_type {
        ValueType::Text => to_text(raw),
        ValueType::Number => to_number(raw).map(number_value).unwrap_or(Value::Null),
        ValueType::Integer => to_number(raw)
            .map(|n| number_value(n.trunc()))
            .unwrap_or(Value::Null),
        ValueType::Boolean => to_bool(raw).map(Value::Bool).unwrap_or(Value::Null),
        ValueType::Date => to_datetime(raw)
            .map(|dt| Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        ValueType::DateTime => to_datetime(raw)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)))
            .unwrap_or(Value::Null),
        ValueType::Any | ValueType::Other(_) => raw.clone(),
    }
}

const I64_BOUND: f64 = 9.223_372_036_854_775_808e18;

/// Build a JSON number, storing integral values as integers so that equal
/// quantities compare equal regardless of how they were computed.
pub fn number_value(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    // 2^63 is the first float past i64::MAX; `as` would saturate it
    if n.fract() == 0.0 && n >= -I64_BOUND && n < I64_BOUND {
        return Value::Number(Number::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn to_text(raw: &Value) -> Value {
    match raw {
        Value::Null => Value::Null,
        Value::String(_) => raw.clone(),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(_) | Value::Object(_) => Value::String(raw.to_string()),
    }
}

fn to_number(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn to_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_datetime(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => parse_datetime(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
