//! Flattened representation of response objects.
use std::collections::HashSet;

use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::ser::SerializeMap;

use super::CacheKey;
use crate::json_ext::Value;

/// Key of the object standing in for a reference.
const REFERENCE: &str = "$reference";
/// Key of the object wrapping a list or object valued scalar.
const SCALAR: &str = "$scalar";

/// The value of a field inside a [`Record`].
///
/// Serialized in the shape a normalized cache stores: references as
/// `{"$reference": "<cache key>"}`, lists as arrays and leaf scalars as themselves. Scalars
/// holding a JSON list or object, as custom scalars may, are wrapped as `{"$scalar": <value>}`
/// so they never read back as a list or a reference.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordValue {
    /// Stands in for a nested object that has its own record.
    Reference(CacheKey),
    List(Vec<RecordValue>),
    Scalar(Value),
}

impl RecordValue {
    pub fn as_reference(&self) -> Option<&CacheKey> {
        match self {
            RecordValue::Reference(key) => Some(key),
            _ => None,
        }
    }

    /// Every reference in this value, including those nested in lists.
    fn collect_references<'a>(&'a self, references: &mut Vec<&'a CacheKey>) {
        match self {
            RecordValue::Reference(key) => references.push(key),
            RecordValue::List(values) => values
                .iter()
                .for_each(|value| value.collect_references(references)),
            RecordValue::Scalar(_) => {}
        }
    }

    fn from_persisted<E>(value: Value) -> Result<Self, E>
    where
        E: de::Error,
    {
        match value {
            Value::Array(values) => values
                .into_iter()
                .map(RecordValue::from_persisted)
                .collect::<Result<_, _>>()
                .map(RecordValue::List),
            Value::Object(object) => {
                if object.len() == 1 {
                    if let Some(reference) = object.get(REFERENCE) {
                        return match reference.as_str() {
                            Some(key) => Ok(RecordValue::Reference(CacheKey::new(key))),
                            None => Err(E::custom("expected a string cache key in $reference")),
                        };
                    }
                    if let Some(scalar) = object.get(SCALAR) {
                        return Ok(RecordValue::Scalar(scalar.clone()));
                    }
                }
                Ok(RecordValue::Scalar(Value::Object(object)))
            }
            leaf => Ok(RecordValue::Scalar(leaf)),
        }
    }
}

impl From<Value> for RecordValue {
    fn from(value: Value) -> Self {
        RecordValue::Scalar(value)
    }
}

impl Serialize for RecordValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RecordValue::Reference(key) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(REFERENCE, key)?;
                map.end()
            }
            RecordValue::List(values) => serializer.collect_seq(values),
            RecordValue::Scalar(value @ (Value::Array(_) | Value::Object(_))) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(SCALAR, value)?;
                map.end()
            }
            RecordValue::Scalar(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for RecordValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RecordValue::from_persisted(Value::deserialize(deserializer)?)
    }
}

/// The fields of one object, keyed by storage key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, RecordValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, storage_key: &str) -> Option<&RecordValue> {
        self.fields.get(storage_key)
    }

    pub fn insert(
        &mut self,
        storage_key: impl Into<String>,
        value: impl Into<RecordValue>,
    ) -> Option<RecordValue> {
        self.fields.insert(storage_key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RecordValue)> {
        self.fields.iter()
    }

    pub fn references(&self) -> Vec<&CacheKey> {
        let mut references = Vec::new();
        self.fields
            .values()
            .for_each(|value| value.collect_references(&mut references));
        references
    }
}

impl FromIterator<(String, RecordValue)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, RecordValue)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Records keyed by the cache key of the object they flatten.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: IndexMap<CacheKey, Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CacheKey, &Record)> {
        self.records.iter()
    }

    /// Merges a record into the set, field by field, the incoming value winning.
    ///
    /// Returns the `<cache key>.<storage key>` of every field whose value was added or changed.
    pub fn merge_record(&mut self, key: CacheKey, record: Record) -> HashSet<String> {
        let mut changed = HashSet::new();
        match self.records.entry(key) {
            Entry::Vacant(entry) => {
                changed.extend(
                    record
                        .fields
                        .keys()
                        .map(|storage_key| format!("{}.{storage_key}", entry.key())),
                );
                entry.insert(record);
            }
            Entry::Occupied(mut entry) => {
                let key = entry.key().clone();
                let existing = entry.get_mut();
                for (storage_key, value) in record.fields {
                    if existing.fields.get(&storage_key) != Some(&value) {
                        changed.insert(format!("{key}.{storage_key}"));
                        existing.fields.insert(storage_key, value);
                    }
                }
            }
        }
        changed
    }

    /// References that have no record in this set.
    pub fn dangling_references(&self) -> Vec<&CacheKey> {
        self.records
            .values()
            .flat_map(Record::references)
            .filter(|key| !self.records.contains_key(*key))
            .collect()
    }
}

impl IntoIterator for RecordSet {
    type Item = (CacheKey, Record);
    type IntoIter = indexmap::map::IntoIter<CacheKey, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
