//! Public entry points of the transformation pipeline.
//!
//! Every call runs the same single pass: resolve the input to a payload (draining
//! streams and sniffing raw text), normalize keys, map and coerce against the
//! destination shape, then decode through canonical JSON.

use std::{fmt, io::Read};

use log::debug;
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    assemble,
    config::Config,
    data::{Record, record_from_json},
    detect::{Payload, detect},
    error::{Error, Result},
    form::{FormValues, nest_form},
    io_utils::{decode_payload, drain, trim_payload},
    normalize::{normalize_dataset, normalize_record},
    schema::{Kind, Shape},
};

/// Everything a transformation accepts.
pub enum Input {
    Text(String),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read>),
    /// Flat key/multi-value pairs; skips format detection.
    Form(FormValues),
    /// A string-keyed mapping; skips format detection.
    Mapping(Record),
    Json(serde_json::Value),
}

impl Input {
    pub fn reader<R: Read + 'static>(reader: R) -> Self {
        Input::Reader(Box::new(reader))
    }

    /// Serializes a typed value to canonical JSON so it re-enters detection like
    /// any other raw payload. Only values that serialize to an object or an array
    /// are accepted.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let json = serde_json::to_value(value).map_err(Error::Marshal)?;
        match json {
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::to_vec(&json).map(Input::Bytes).map_err(Error::Marshal)
            }
            other => Err(Error::UnsupportedInput(format!(
                "{} does not serialize to a record",
                json_kind(&other)
            ))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Input::Text(_) => "text",
            Input::Bytes(_) => "bytes",
            Input::Reader(_) => "reader",
            Input::Form(_) => "form",
            Input::Mapping(_) => "mapping",
            Input::Json(_) => "json",
        }
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Input").field(&self.kind_name()).finish()
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Text(value.to_string())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Text(value)
    }
}

impl From<&[u8]> for Input {
    fn from(value: &[u8]) -> Self {
        Input::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Input {
    fn from(value: Vec<u8>) -> Self {
        Input::Bytes(value)
    }
}

impl From<FormValues> for Input {
    fn from(value: FormValues) -> Self {
        Input::Form(value)
    }
}

impl From<Record> for Input {
    fn from(value: Record) -> Self {
        Input::Mapping(value)
    }
}

impl From<serde_json::Value> for Input {
    fn from(value: serde_json::Value) -> Self {
        Input::Json(value)
    }
}

/// Transforms `input` into a freshly built `T`.
///
/// `T` must be record-shaped, an optional record, a collection, a string-keyed
/// map, or untyped (`serde_json::Value`); anything else is rejected before the
/// input is read.
pub fn transform<T>(input: impl Into<Input>, config: &Config) -> Result<T>
where
    T: Shape + DeserializeOwned,
{
    let kind = T::kind();
    validate_destination(&kind)?;
    let input = drain_reader(input.into())?;

    if fast_path_eligible(config)
        && let Some(raw) = raw_bytes(&input)
    {
        let text = decode_payload(raw);
        let text = trim_payload(&text);
        // Arrays take the pipeline so a non-normalizing run sees the same dataset
        // detection as a normalizing one.
        if text.starts_with('{') {
            match serde_json::from_str::<T>(text) {
                Ok(decoded) => return Ok(decoded),
                Err(err) => config.log(&format!(
                    "direct JSON decode failed: {err}; running the full pipeline"
                )),
            }
        }
    }

    let payload = normalize(resolve(input, config)?, config);
    let prepared = assemble::prepare(payload, &kind, config)?;
    assemble::decode(prepared, &kind, config)
}

/// Transforms `input` into `destination`, which is replaced only on success.
pub fn transform_into<T>(input: impl Into<Input>, destination: &mut T, config: &Config) -> Result<()>
where
    T: Shape + DeserializeOwned,
{
    *destination = transform(input, config)?;
    Ok(())
}

/// Untyped round trip: the detected record or dataset as canonical JSON bytes.
pub fn transform_to_canonical(input: impl Into<Input>, config: &Config) -> Result<Vec<u8>> {
    let value: serde_json::Value = transform(input, config)?;
    serde_json::to_vec(&value).map_err(Error::Marshal)
}

/// Transforms into `T`, then re-emits the result as canonical JSON bytes.
pub fn transform_to_canonical_as<T>(input: impl Into<Input>, config: &Config) -> Result<Vec<u8>>
where
    T: Shape + Serialize + DeserializeOwned,
{
    let value: T = transform(input, config)?;
    serde_json::to_vec(&value).map_err(Error::Marshal)
}

fn validate_destination(kind: &Kind) -> Result<()> {
    let valid = match kind {
        Kind::Any | Kind::Map => true,
        Kind::Collection(element) => {
            matches!(element.as_ref(), Kind::Any | Kind::Map) || element.record_ref().is_some()
        }
        other => other.record_ref().is_some(),
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidDestination(format!(
            "expected a record or a collection of records, found {kind}"
        )))
    }
}

fn fast_path_eligible(config: &Config) -> bool {
    !config.normalize_keys && !config.strict
}

fn drain_reader(input: Input) -> Result<Input> {
    match input {
        Input::Reader(reader) => drain(reader).map(Input::Bytes).map_err(Error::Read),
        other => Ok(other),
    }
}

fn raw_bytes(input: &Input) -> Option<&[u8]> {
    match input {
        Input::Text(text) => Some(text.as_bytes()),
        Input::Bytes(bytes) => Some(bytes),
        _ => None,
    }
}

fn resolve(input: Input, config: &Config) -> Result<Payload> {
    match input {
        Input::Text(text) => Ok(detect(text.as_bytes(), config).payload),
        Input::Bytes(bytes) => Ok(detect(&bytes, config).payload),
        Input::Reader(reader) => {
            let bytes = drain(reader).map_err(Error::Read)?;
            Ok(detect(&bytes, config).payload)
        }
        Input::Form(values) => Ok(Payload::Record(nest_form(&values, config.number_conversion))),
        Input::Mapping(record) => Ok(Payload::Record(record)),
        Input::Json(serde_json::Value::Object(object)) => Ok(Payload::Record(record_from_json(object))),
        Input::Json(other) => Err(Error::UnsupportedInput(format!(
            "JSON {} is not a record",
            json_kind(&other)
        ))),
    }
}

fn normalize(payload: Payload, config: &Config) -> Payload {
    if !config.normalize_keys {
        return payload;
    }
    debug!("Normalizing {} row(s)", payload.rows());
    match payload {
        Payload::Record(record) => Payload::Record(normalize_record(record, config.normalizer())),
        Payload::Dataset(rows) => Payload::Dataset(normalize_dataset(rows, config.normalizer())),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
