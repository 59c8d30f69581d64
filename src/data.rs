//! Dynamic intermediate values shared by every stage of the pipeline.
//!
//! A [`Record`] is the universal currency between input formats and destination
//! shapes; a [`Dataset`] is an ordered run of records produced by multi-row inputs.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::ser::Error as _;

pub type Record = BTreeMap<String, Value>;
pub type Dataset = Vec<Record>;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    /// Integers above `i64::MAX`.
    Unsigned(u64),
    Float(f64),
    String(String),
    Record(Record),
    Sequence(Vec<Value>),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Unsigned(_) => "unsigned",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Record(_) => "record",
            Value::Sequence(_) => "sequence",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_blank_string(&self) -> bool {
        matches!(self, Value::String(s) if s.trim().is_empty())
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Unsigned(u) => u.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Record(_) | Value::Sequence(_) => match self.to_json() {
                Ok(json) => json.to_string(),
                Err(_) => format!("<{}>", self.kind_name()),
            },
        }
    }

    /// Collapses floats with an integral value into integers, recursively.
    pub fn collapse_integral_floats(self) -> Value {
        match self {
            Value::Float(f) => integral_float(f).unwrap_or(Value::Float(f)),
            Value::Record(record) => Value::Record(collapse_record(record)),
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(Value::collapse_integral_floats)
                    .collect(),
            ),
            other => other,
        }
    }

    /// Canonical wire form. Fails on non-finite floats.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Unsigned(u) => serde_json::Value::from(*u),
            Value::Float(f) => {
                let number = serde_json::Number::from_f64(*f).ok_or_else(|| {
                    serde_json::Error::custom(format!("unsupported value: {f}"))
                })?;
                serde_json::Value::Number(number)
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Record(record) => serde_json::Value::Object(record_to_json(record)?),
            Value::Sequence(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => number_to_value(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Record(record_from_json(map)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Unsigned(value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Sequence(value)
    }
}

pub fn record_from_json(map: serde_json::Map<String, serde_json::Value>) -> Record {
    map.into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect()
}

pub fn record_to_json(
    record: &Record,
) -> Result<serde_json::Map<String, serde_json::Value>, serde_json::Error> {
    record
        .iter()
        .map(|(key, value)| Ok((key.clone(), value.to_json()?)))
        .collect()
}

fn collapse_record(record: Record) -> Record {
    record
        .into_iter()
        .map(|(key, value)| (key, value.collapse_integral_floats()))
        .collect()
}

fn number_to_value(number: &serde_json::Number) -> Value {
    if let Some(i) = number.as_i64() {
        return Value::Integer(i);
    }
    if let Some(u) = number.as_u64() {
        return Value::Unsigned(u);
    }
    match number.as_f64() {
        Some(f) => Value::Float(f).collapse_integral_floats(),
        None => Value::String(number.to_string()),
    }
}

fn integral_float(f: f64) -> Option<Value> {
    if !f.is_finite() || f.fract() != 0.0 {
        return None;
    }
    // The MAX bounds round up to 2^63 and 2^64, which no longer fit.
    if f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(Value::Integer(f as i64))
    } else if f >= 0.0 && f < u64::MAX as f64 {
        Some(Value::Unsigned(f as u64))
    } else {
        None
    }
}

/// Boolean literals accepted from text: `1 t T TRUE true True` and their false counterparts.
pub fn parse_bool_literal(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Opportunistic typing of free text: integer, then float, then boolean, else text.
///
/// Numbers are tried before booleans so `"1"` stays an integer.
pub fn best_type(value: &str) -> Value {
    if value.is_empty() {
        return Value::String(String::new());
    }
    if let Ok(parsed) = value.parse::<i64>() {
        return Value::Integer(parsed);
    }
    if let Ok(parsed) = value.parse::<u64>() {
        return Value::Unsigned(parsed);
    }
    if let Ok(parsed) = value.parse::<f64>()
        && parsed.is_finite()
    {
        return Value::Float(parsed);
    }
    if let Some(parsed) = parse_bool_literal(value) {
        return Value::Bool(parsed);
    }
    Value::String(value.to_string())
}

/// Parses a timestamp against the accepted formats, first match wins:
/// RFC 3339 with and without fractional seconds, `date time`, bare `date`.
/// Offset-less formats are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S"];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d"];

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed);
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(parsed.and_utc().fixed_offset());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt)
            && let Some(midnight) = parsed.and_hms_opt(0, 0, 0)
        {
            return Some(midnight.and_utc().fixed_offset());
        }
    }
    None
}
