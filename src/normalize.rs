//! Deep key rewriting for records and datasets.
//!
//! Keys are rewritten through nested records and through records held in
//! sequences. When two source keys collapse onto the same normalized key, source
//! keys are visited in sorted order and the first one keeps the slot.

use log::debug;

use crate::{
    config::KeyNormalizer,
    data::{Dataset, Record, Value},
};

pub fn normalize_record(record: Record, normalizer: &KeyNormalizer) -> Record {
    let mut out = Record::new();
    for (key, value) in record {
        let normalized = normalizer(&key);
        if out.contains_key(&normalized) {
            debug!("Key '{key}' collides with an earlier key on '{normalized}'; dropped");
            continue;
        }
        out.insert(normalized, normalize_value(value, normalizer));
    }
    out
}

pub fn normalize_dataset(rows: Dataset, normalizer: &KeyNormalizer) -> Dataset {
    rows.into_iter()
        .map(|row| normalize_record(row, normalizer))
        .collect()
}

fn normalize_value(value: Value, normalizer: &KeyNormalizer) -> Value {
    match value {
        Value::Record(record) => Value::Record(normalize_record(record, normalizer)),
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .map(|item| normalize_value(item, normalizer))
                .collect(),
        ),
        other => other,
    }
}
