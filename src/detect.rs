//! Raw payload format detection.
//!
//! Formats are tried in a fixed order and the first that fits wins: empty, JSON
//! object, JSON array of objects, URL-encoded form, YAML (only when enabled),
//! XML, CSV, and finally a plain-text fallback stored under `value`. Detection
//! never fails; anything unrecognised ends up in the fallback.

use std::fmt;

use log::debug;

use crate::{
    config::Config,
    data::{Dataset, Record, Value, record_from_json},
    form::{FormValues, nest_form},
    io_utils::{decode_payload, trim_payload},
    tabular::parse_table,
    yaml::{self, YamlValue},
};

/// Key the plain-text fallback stores its content under.
pub const FALLBACK_KEY: &str = "value";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Empty,
    Json,
    JsonArray,
    Form,
    Yaml,
    Xml,
    Csv,
    Text,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Empty => "empty",
            Format::Json => "json",
            Format::JsonArray => "json-array",
            Format::Form => "form",
            Format::Yaml => "yaml",
            Format::Xml => "xml",
            Format::Csv => "csv",
            Format::Text => "text",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either a single record or a dataset; never both.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Record(Record),
    Dataset(Dataset),
}

impl Payload {
    pub fn rows(&self) -> usize {
        match self {
            Payload::Record(_) => 1,
            Payload::Dataset(rows) => rows.len(),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Payload::Record(record) => Value::Record(record),
            Payload::Dataset(rows) => Value::Sequence(rows.into_iter().map(Value::Record).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detected {
    pub format: Format,
    pub payload: Payload,
}

impl Detected {
    fn record(format: Format, record: Record) -> Self {
        Self {
            format,
            payload: Payload::Record(record),
        }
    }

    fn dataset(format: Format, rows: Dataset) -> Self {
        Self {
            format,
            payload: Payload::Dataset(rows),
        }
    }
}

pub fn detect(raw: &[u8], config: &Config) -> Detected {
    let decoded = decode_payload(raw);
    let text = trim_payload(&decoded);
    let detected = detect_text(text, config);
    debug!(
        "Detected {} payload ({} row(s)) from {} byte(s)",
        detected.format,
        detected.payload.rows(),
        raw.len()
    );
    detected
}

fn detect_text(text: &str, config: &Config) -> Detected {
    if text.is_empty() {
        return Detected::record(Format::Empty, Record::new());
    }
    if let Ok(object) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(text) {
        return Detected::record(Format::Json, record_from_json(object));
    }
    if let Ok(objects) = serde_json::from_str::<Vec<serde_json::Map<String, serde_json::Value>>>(text) {
        return Detected::dataset(
            Format::JsonArray,
            objects.into_iter().map(record_from_json).collect(),
        );
    }
    if looks_like_form(text) {
        let values = FormValues::parse(text);
        return Detected::record(Format::Form, nest_form(&values, config.number_conversion));
    }
    if config.yaml
        && let Some(payload) = parse_yaml(text)
    {
        return Detected {
            format: Format::Yaml,
            payload,
        };
    }
    if let Some(record) = parse_xml(text) {
        return Detected::record(Format::Xml, record);
    }
    if looks_like_csv(text) {
        match parse_table(text) {
            Ok(rows) if !rows.is_empty() => return Detected::dataset(Format::Csv, rows),
            Ok(_) => {}
            Err(err) => debug!("CSV parse failed, using text fallback: {err}"),
        }
    }
    Detected::record(
        Format::Text,
        Record::from([(FALLBACK_KEY.to_string(), Value::from(text))]),
    )
}

fn looks_like_form(text: &str) -> bool {
    text.contains('=') && !text.contains(['<', '>', '{', '}'])
}

fn looks_like_csv(text: &str) -> bool {
    text.contains('\n') && text.lines().next().is_some_and(|line| line.contains(','))
}

/// Only mappings and sequences of mappings count as YAML; scalars fall through
/// so that plain text and CSV are not swallowed by the YAML parser.
fn parse_yaml(text: &str) -> Option<Payload> {
    let parsed = match yaml::parse_str(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!("YAML parse failed: {err}");
            return None;
        }
    };
    match parsed {
        YamlValue::Mapping(_) => match yaml::to_dynamic(parsed) {
            Value::Record(record) => Some(Payload::Record(record)),
            _ => None,
        },
        YamlValue::Sequence(items) if items.iter().all(YamlValue::is_mapping) => {
            let rows = items
                .into_iter()
                .filter_map(|item| match yaml::to_dynamic(item) {
                    Value::Record(record) => Some(record),
                    _ => None,
                })
                .collect();
            Some(Payload::Dataset(rows))
        }
        _ => None,
    }
}

fn parse_xml(text: &str) -> Option<Record> {
    if !text.starts_with('<') {
        return None;
    }
    let document = match roxmltree::Document::parse(text) {
        Ok(document) => document,
        Err(err) => {
            debug!("XML parse failed: {err}");
            return None;
        }
    };
    let root = document.root_element();
    Some(match xml_element(root) {
        Value::Record(record) => record,
        leaf => Record::from([(root.tag_name().name().to_string(), leaf)]),
    })
}

/// Child elements become keys, repeated tags collect into a sequence, and
/// text-only elements become strings. Attributes are ignored.
fn xml_element(node: roxmltree::Node<'_, '_>) -> Value {
    let mut children = node.children().filter(|child| child.is_element()).peekable();
    if children.peek().is_none() {
        return Value::from(node.text().unwrap_or_default().trim());
    }
    let mut record = Record::new();
    for child in children {
        let key = child.tag_name().name().to_string();
        let value = xml_element(child);
        match record.get_mut(&key) {
            Some(Value::Sequence(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::Sequence(vec![first, value]);
            }
            None => {
                record.insert(key, value);
            }
        }
    }
    Value::Record(record)
}
