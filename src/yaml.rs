//! YAML parsing and dumping over `serde_yaml`.

use anyhow::Result;

pub use serde_yaml::Value as YamlValue;

use crate::data::{Record, Value};

pub fn parse_str(input: &str) -> Result<YamlValue> {
    Ok(serde_yaml::from_str(input)?)
}

pub fn to_string<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

/// Converts a parsed YAML node into a dynamic value. Mapping keys that are not
/// strings are stringified; tags are unwrapped.
pub fn to_dynamic(value: YamlValue) -> Value {
    match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(u) = n.as_u64() {
                Value::Unsigned(u)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f).collapse_integral_floats()
            } else {
                Value::String(n.to_string())
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(items) => Value::Sequence(items.into_iter().map(to_dynamic).collect()),
        YamlValue::Mapping(mapping) => {
            let record: Record = mapping
                .into_iter()
                .map(|(key, value)| (key_to_string(key), to_dynamic(value)))
                .collect();
            Value::Record(record)
        }
        YamlValue::Tagged(tagged) => to_dynamic(tagged.value),
    }
}

fn key_to_string(key: YamlValue) -> String {
    match key {
        YamlValue::String(s) => s,
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
