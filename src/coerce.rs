//! Destination-aware coercion of primitive values.
//!
//! Runs after mapping and walks the same destination shape. Conversions that do
//! not apply leave the value untouched so the final decode fails loudly instead
//! of guessing.

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::{
    config::Config,
    data::{Record, Value, parse_bool_literal, parse_timestamp},
    mapper::map_record,
    schema::{Kind, RecordShape, TemporalKind},
};

pub fn coerce(value: Value, kind: &Kind, config: &Config) -> Value {
    match kind {
        Kind::Any | Kind::Map | Kind::String => value,
        Kind::Optional(inner) => {
            if value.is_blank_string() {
                Value::Null
            } else {
                coerce(value, inner, config)
            }
        }
        Kind::Boolean => match value {
            Value::String(s) => match parse_bool_literal(&s) {
                Some(parsed) => Value::Bool(parsed),
                None => Value::String(s),
            },
            other => other,
        },
        Kind::Integer => match value {
            Value::String(s) => match s.parse::<i64>() {
                Ok(parsed) => Value::Integer(parsed),
                Err(_) => Value::String(s),
            },
            Value::Float(f) if f.is_finite() => Value::Integer(f.trunc() as i64),
            other => other,
        },
        Kind::Unsigned => coerce_unsigned(value),
        Kind::Float => match value {
            Value::String(s) => match s.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => Value::Float(parsed),
                _ => Value::String(s),
            },
            Value::Integer(i) => Value::Float(i as f64),
            Value::Unsigned(u) => Value::Float(u as f64),
            other => other,
        },
        Kind::Temporal(temporal) => match value {
            Value::String(s) => match parse_timestamp(&s) {
                Some(parsed) => Value::String(render_temporal(&parsed, *temporal)),
                None => Value::String(s),
            },
            other => other,
        },
        Kind::Record(record) => match value {
            Value::Record(sub) => Value::Record(coerce_record(sub, &record.shape(), config)),
            other => other,
        },
        Kind::Collection(element) => match value {
            Value::Sequence(items) => Value::Sequence(
                items
                    .into_iter()
                    .map(|item| coerce(item, element, config))
                    .collect(),
            ),
            other => other,
        },
    }
}

/// Canonicalizes `record` through the mapper, then coerces every claimed field.
pub fn coerce_record(record: Record, shape: &RecordShape, config: &Config) -> Record {
    let mapped = map_record(record, shape, config);
    coerce_fields(mapped.record, shape, config)
}

/// Coerces fields of a record already keyed by canonical names. Keys that are not
/// fields pass through.
pub fn coerce_fields(record: Record, shape: &RecordShape, config: &Config) -> Record {
    record
        .into_iter()
        .map(|(key, value)| match shape.by_canonical(&key) {
            Some(field) => {
                let coerced = coerce(value, &field.kind, config);
                (key, coerced)
            }
            None => (key, value),
        })
        .collect()
}

fn coerce_unsigned(value: Value) -> Value {
    match value {
        Value::String(s) => match s.parse::<u64>() {
            Ok(parsed) => Value::from(parsed),
            Err(_) => Value::String(s),
        },
        Value::Float(f) if f.is_finite() && f < 0.0 => Value::Integer(0),
        Value::Float(f) if f.is_finite() => {
            let truncated = f.trunc();
            if truncated < i64::MAX as f64 {
                Value::Integer(truncated as i64)
            } else if truncated < u64::MAX as f64 {
                Value::Unsigned(truncated as u64)
            } else {
                Value::Float(truncated)
            }
        }
        other => other,
    }
}

fn render_temporal(parsed: &DateTime<FixedOffset>, temporal: TemporalKind) -> String {
    match temporal {
        TemporalKind::Timestamp => parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        TemporalKind::LocalDateTime => parsed
            .naive_local()
            .format("%Y-%m-%dT%H:%M:%S%.f")
            .to_string(),
        TemporalKind::Date => parsed.naive_local().date().format("%Y-%m-%d").to_string(),
    }
}
