//! Schema-aware key matching.
//!
//! Incoming keys arrive already normalized and are looked up verbatim, against a
//! lookup built from each field's canonical and declared names passed once
//! through the active key normalizer. Raw canonical names are registered too, so
//! a record the mapper already emitted maps onto itself. Matched values are
//! re-emitted under the canonical name; nested records recurse. Keys
//! nobody claims are carried through unchanged and reported as unmatched, with
//! nested ones prefixed by their parent's canonical name (`address.zip`).

use std::collections::{HashMap, HashSet, hash_map::Entry};

use log::debug;

use crate::{
    config::Config,
    data::{Record, Value},
    schema::{FieldDescriptor, RecordShape},
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapped {
    pub record: Record,
    pub unmatched: Vec<String>,
}

pub fn map_record(input: Record, shape: &RecordShape, config: &Config) -> Mapped {
    let lookup = build_lookup(shape, config);
    let mut out = Record::new();
    let mut unmatched = Vec::new();
    let mut claimed: HashSet<&str> = HashSet::new();

    for (key, value) in input {
        let field = lookup.get(key.as_str()).copied();
        match field {
            Some(field) if claimed.insert(field.canonical.as_str()) => {
                let value = match (field.kind.record_ref(), value) {
                    (Some(nested), Value::Record(sub)) => {
                        let mapped = map_record(sub, &nested.shape(), config);
                        unmatched.extend(
                            mapped
                                .unmatched
                                .into_iter()
                                .map(|path| format!("{}.{}", field.canonical, path)),
                        );
                        Value::Record(mapped.record)
                    }
                    (_, other) => other,
                };
                out.insert(field.canonical.clone(), value);
            }
            _ => {
                unmatched.push(key.clone());
                out.entry(key).or_insert(value);
            }
        }
    }

    Mapped {
        record: out,
        unmatched,
    }
}

/// Canonical names register before declared-name aliases; within each pass the
/// first declared field keeps a contested key. Raw canonical names only fill
/// slots nothing else claimed.
pub fn build_lookup<'s>(
    shape: &'s RecordShape,
    config: &Config,
) -> HashMap<String, &'s FieldDescriptor> {
    let mut lookup = HashMap::with_capacity(shape.fields().len() * 3);
    for field in shape.fields() {
        register(&mut lookup, config.match_key(&field.canonical), field, shape);
    }
    for field in shape.fields() {
        register(&mut lookup, config.match_key(&field.name), field, shape);
    }
    for field in shape.fields() {
        lookup.entry(field.canonical.clone()).or_insert(field);
    }
    lookup
}

fn register<'s>(
    lookup: &mut HashMap<String, &'s FieldDescriptor>,
    key: String,
    field: &'s FieldDescriptor,
    shape: &RecordShape,
) {
    match lookup.entry(key) {
        Entry::Vacant(slot) => {
            slot.insert(field);
        }
        Entry::Occupied(slot) => {
            if slot.get().canonical != field.canonical {
                debug!(
                    "Fields '{}' and '{}' of {} share lookup key '{}'; '{}' is unreachable",
                    slot.get().canonical,
                    field.canonical,
                    shape.type_name(),
                    slot.key(),
                    field.canonical
                );
            }
        }
    }
}
