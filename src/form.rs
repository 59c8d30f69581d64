//! Form-style inputs and the dotted-key nester.
//!
//! [`FormValues`] keeps key/multi-value pairs in first-seen key order. The nester
//! folds `a.b.c` keys into nested records; when a flat key and a dotted key share
//! a head segment the nested interpretation wins and the flat value is dropped.

use crate::data::{Record, Value, best_type};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    entries: Vec<(String, Vec<String>)>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` body.
    pub fn parse(body: &str) -> Self {
        url::form_urlencoded::parse(body.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FormValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut values = FormValues::new();
        for (key, value) in iter {
            values.append(key, value);
        }
        values
    }
}

/// Folds form pairs into a record. A key seen once yields a single value, a
/// repeated key yields a sequence. With `convert_numbers` each value is
/// opportunistically typed.
pub fn nest_form(values: &FormValues, convert_numbers: bool) -> Record {
    let leaf = |raw: &str| {
        if convert_numbers {
            best_type(raw)
        } else {
            Value::String(raw.to_string())
        }
    };
    nest_entries(values.iter().map(|(key, occurrences)| {
        let value = match occurrences {
            [single] => leaf(single.as_str()),
            many => Value::Sequence(many.iter().map(|s| leaf(s.as_str())).collect()),
        };
        (key, value)
    }))
}

/// Applies every dotted key first, then flat keys only where the dotted pass left
/// the slot empty.
pub fn nest_entries<'a, I>(entries: I) -> Record
where
    I: IntoIterator<Item = (&'a str, Value)>,
{
    let (dotted, flat): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|(key, _)| key.contains('.'));

    let mut out = Record::new();
    for (key, value) in dotted {
        let path: Vec<&str> = key.split('.').collect();
        assign_path(&mut out, &path, value);
    }
    for (key, value) in flat {
        if out.contains_key(key) {
            continue;
        }
        out.insert(key.to_string(), value);
    }
    out
}

fn assign_path(record: &mut Record, path: &[&str], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    if rest.is_empty() {
        record.insert((*head).to_string(), value);
        return;
    }
    let slot = record
        .entry((*head).to_string())
        .or_insert_with(|| Value::Record(Record::new()));
    if !matches!(slot, Value::Record(_)) {
        *slot = Value::Record(Record::new());
    }
    if let Value::Record(nested) = slot {
        assign_path(nested, rest, value);
    }
}
