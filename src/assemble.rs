//! Assembly of mapped, coerced values and the final decode.
//!
//! Non-strict decoding retries once after collapsing integral floats into
//! integers; the retry never recurses. Strict decoding refuses unmatched keys
//! before decoding, then walks the prepared value against the destination shape
//! as a second check (this one also reaches records inside collections).

use serde::de::DeserializeOwned;

use crate::{
    coerce::{coerce, coerce_fields},
    config::Config,
    data::{Record, Value},
    detect::Payload,
    error::{Error, Result},
    mapper::map_record,
    schema::Kind,
};

/// Maps and coerces a payload for `kind`, narrowing or widening between a single
/// record and a dataset as the destination requires.
pub fn prepare(payload: Payload, kind: &Kind, config: &Config) -> Result<Value> {
    match kind {
        Kind::Any => Ok(payload.into_value()),
        Kind::Collection(element) => {
            let rows = match payload {
                Payload::Dataset(rows) => rows,
                Payload::Record(record) => vec![record],
            };
            let mut prepared = Vec::with_capacity(rows.len());
            for row in rows {
                prepared.push(prepare_row(row, element, config)?);
            }
            Ok(Value::Sequence(prepared))
        }
        _ => {
            let record = match payload {
                Payload::Record(record) => record,
                Payload::Dataset(rows) => rows.into_iter().next().unwrap_or_default(),
            };
            prepare_row(record, kind, config)
        }
    }
}

fn prepare_row(record: Record, kind: &Kind, config: &Config) -> Result<Value> {
    let Some(target) = kind.record_ref() else {
        return Ok(coerce(Value::Record(record), kind, config));
    };
    let shape = target.shape();
    let mapped = map_record(record, &shape, config);
    if config.strict && !mapped.unmatched.is_empty() {
        return Err(Error::StrictViolation(mapped.unmatched));
    }
    Ok(Value::Record(coerce_fields(mapped.record, &shape, config)))
}

pub fn decode<T: DeserializeOwned>(prepared: Value, kind: &Kind, config: &Config) -> Result<T> {
    if config.strict {
        let mut unknown = Vec::new();
        collect_unknown_fields(&prepared, kind, "", &mut unknown);
        if !unknown.is_empty() {
            return Err(Error::StrictViolation(unknown));
        }
        let json = prepared.to_json().map_err(Error::Marshal)?;
        return serde_json::from_value(json).map_err(Error::DecodeFailed);
    }

    let json = prepared.to_json().map_err(Error::Marshal)?;
    match serde_json::from_value(json) {
        Ok(decoded) => Ok(decoded),
        Err(err) => {
            config.log(&format!(
                "decode into target failed: {err}; retrying with best-effort numeric conversion"
            ));
            let relaxed = prepared.collapse_integral_floats().to_json().map_err(Error::Marshal)?;
            serde_json::from_value(relaxed).map_err(Error::DecodeFailed)
        }
    }
}

/// Dotted paths of keys that are not canonical field names anywhere under `kind`.
pub fn collect_unknown_fields(value: &Value, kind: &Kind, path: &str, unknown: &mut Vec<String>) {
    match (kind, value) {
        (Kind::Optional(inner), _) => collect_unknown_fields(value, inner, path, unknown),
        (Kind::Record(target), Value::Record(record)) => {
            let shape = target.shape();
            for (key, nested) in record {
                let nested_path = join_path(path, key);
                match shape.by_canonical(key) {
                    Some(field) => collect_unknown_fields(nested, &field.kind, &nested_path, unknown),
                    None => unknown.push(nested_path),
                }
            }
        }
        (Kind::Collection(element), Value::Sequence(items)) => {
            for (idx, item) in items.iter().enumerate() {
                collect_unknown_fields(item, element, &join_path(path, &idx.to_string()), unknown);
            }
        }
        _ => {}
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde::Deserialize;

    use super::*;
    use crate::{
        data::Dataset,
        record_shape,
        schema::{Kind, Shape},
    };

    #[derive(Debug, Deserialize, PartialEq)]
    struct Tag {
        label: String,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
        #[serde(default)]
        tags: Vec<Tag>,
    }

    record_shape!(Tag { label: String });
    record_shape!(Item { id: i64, tags: Vec<Tag> });

    fn row(json: serde_json::Value) -> Record {
        match Value::from(json) {
            Value::Record(record) => record,
            _ => panic!("record expected"),
        }
    }

    #[test]
    fn dataset_into_single_record_uses_first_row() {
        let rows: Dataset = vec![row(serde_json::json!({"id": 1})), row(serde_json::json!({"id": 2}))];
        let config = Config::default();
        let prepared = prepare(Payload::Dataset(rows), &Item::kind(), &config).unwrap();
        let item: Item = decode(prepared, &Item::kind(), &config).unwrap();
        assert_eq!(item.id, 1);
    }

    #[test]
    fn empty_dataset_into_single_record_is_an_empty_record() {
        let config = Config::default();
        let prepared = prepare(Payload::Dataset(Vec::new()), &Item::kind(), &config).unwrap();
        assert_eq!(prepared, Value::Record(Record::new()));
    }

    #[test]
    fn strict_rows_abort_the_whole_collection() {
        let rows = vec![
            row(serde_json::json!({"id": 1})),
            row(serde_json::json!({"id": 2, "ghost": true})),
        ];
        let config = Config::default().with_strict(true);
        let err = prepare(Payload::Dataset(rows), &Vec::<Item>::kind(), &config).unwrap_err();
        match err {
            Error::StrictViolation(paths) => assert_eq!(paths, vec!["ghost".to_string()]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn strict_decode_rejects_unknown_keys_inside_collections() {
        let config = Config::default().with_strict(true);
        let prepared = prepare(
            Payload::Record(row(serde_json::json!({"id": 1, "tags": [{"label": "a", "colour": "red"}]}))),
            &Item::kind(),
            &config,
        )
        .unwrap();
        let err = decode::<Item>(prepared, &Item::kind(), &config).unwrap_err();
        match err {
            Error::StrictViolation(paths) => assert_eq!(paths, vec!["tags.0.colour".to_string()]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn best_effort_retry_collapses_integral_floats() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let config = Config::default().with_logger(move |message| {
            sink.lock().unwrap().push(message.to_string());
        });
        let prepared = Value::Record(Record::from([("id".to_string(), Value::Float(4.0))]));
        let item: Item = decode(prepared, &Item::kind(), &config).unwrap();
        assert_eq!(item.id, 4);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_retry_surfaces_decode_error() {
        let config = Config::default();
        let prepared = Value::Record(Record::from([("id".to_string(), Value::from("four"))]));
        let err = decode::<Item>(prepared, &Item::kind(), &config).unwrap_err();
        assert!(matches!(err, Error::DecodeFailed(_)));
    }

    #[test]
    fn non_finite_floats_fail_to_marshal() {
        let config = Config::default();
        let prepared = Value::Record(Record::from([("id".to_string(), Value::Float(f64::NAN))]));
        let err = decode::<Item>(prepared, &Item::kind(), &config).unwrap_err();
        assert!(matches!(err, Error::Marshal(_)));
    }

    #[test]
    fn untyped_destination_keeps_rows() {
        let config = Config::default();
        let rows = vec![row(serde_json::json!({"a": 1})), row(serde_json::json!({"a": 2}))];
        let prepared = prepare(Payload::Dataset(rows), &Kind::Any, &config).unwrap();
        let Value::Sequence(items) = prepared else {
            panic!("sequence expected");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn map_destination_narrows_a_dataset_to_its_first_row() {
        let config = Config::default();
        let rows = vec![row(serde_json::json!({"a": 1})), row(serde_json::json!({"a": 2}))];
        let prepared = prepare(Payload::Dataset(rows), &Kind::Map, &config).unwrap();
        assert_eq!(prepared, Value::Record(row(serde_json::json!({"a": 1}))));
        let empty = prepare(Payload::Dataset(Vec::new()), &Kind::Map, &config).unwrap();
        assert_eq!(empty, Value::Record(Record::new()));
    }
}
