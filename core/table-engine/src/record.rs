//! FILENAME: core/table-engine/src/record.rs
//! PURPOSE: Records, row identity, and the canonical record store.
//! CONTEXT: The store owns the loaded records in their original load order
//! and keeps a separate canonical order that the sort stage rewrites. The
//! original order is never overwritten, so clearing a sort restores it exactly.
//!
//! Row identity is a `RowKey` rather than the record's own id field. Each
//! load bumps the store generation, so keys handed out for an earlier load
//! never match records of a later one, even if their contents are identical.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::value::FieldValue;

/// Returned for fields a record does not carry.
static NULL_VALUE: FieldValue = FieldValue::Null;

// ============================================================================
// ROW IDENTITY
// ============================================================================

/// Identity of one loaded record: (load generation, position in load order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowKey {
    pub generation: u32,
    pub index: u32,
}

impl RowKey {
    pub fn new(generation: u32, index: u32) -> Self {
        RowKey { generation, index }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// One data row: an open field name -> value mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: FxHashMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Record {
            fields: FxHashMap::default(),
        }
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Reads a field. Missing fields read as `Null`.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&NULL_VALUE)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Display text of a field (empty for missing/null).
    pub fn text(&self, field: &str) -> String {
        self.get(field).display_text()
    }

    /// Builds a record from a JSON object. Returns None for non-objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut fields = FxHashMap::default();
        fields.reserve(object.len());
        for (key, value) in object {
            fields.insert(key.clone(), FieldValue::from_json(value));
        }
        Some(Record { fields })
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

/// Owns the loaded records and the canonical (possibly sorted) order.
#[derive(Debug, Default)]
pub struct RecordStore {
    /// Incremented on every load; 0 means nothing was loaded yet.
    generation: u32,

    /// Records in load order. `RowKey::index` points into this vector.
    records: Vec<Record>,

    /// Current canonical order (sorted, or load order when unsorted).
    canonical: Vec<RowKey>,
}

impl RecordStore {
    pub fn new() -> Self {
        RecordStore::default()
    }

    /// Replaces the whole dataset. Records whose identity field is absent
    /// (or falsy) get `position + 1` as their identity.
    /// Returns the number of identities that were backfilled.
    pub fn replace(&mut self, mut records: Vec<Record>, identity_field: &str) -> usize {
        let mut backfilled = 0;
        for (index, record) in records.iter_mut().enumerate() {
            if !record.get(identity_field).is_truthy() {
                record.set(identity_field, FieldValue::Number((index + 1) as f64));
                backfilled += 1;
            }
        }

        self.generation = self.generation.wrapping_add(1);
        self.records = records;
        self.canonical = self.original_order();
        backfilled
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record. Keys from another generation resolve to None.
    pub fn get(&self, key: RowKey) -> Option<&Record> {
        if key.generation != self.generation {
            return None;
        }
        self.records.get(key.index as usize)
    }

    pub fn contains(&self, key: RowKey) -> bool {
        self.get(key).is_some()
    }

    /// Keys in load order.
    pub fn original_order(&self) -> Vec<RowKey> {
        (0..self.records.len() as u32)
            .map(|index| RowKey::new(self.generation, index))
            .collect()
    }

    pub fn canonical(&self) -> &[RowKey] {
        &self.canonical
    }

    /// Installs a new canonical order produced by the sort stage.
    pub fn set_canonical(&mut self, order: Vec<RowKey>) {
        debug_assert_eq!(order.len(), self.records.len());
        self.canonical = order;
    }

    pub fn restore_original_order(&mut self) {
        self.canonical = self.original_order();
    }

    /// Iterates records in canonical order.
    pub fn iter_canonical(&self) -> impl Iterator<Item = (RowKey, &Record)> + '_ {
        self.canonical
            .iter()
            .filter_map(move |&key| self.get(key).map(|record| (key, record)))
    }

    /// Iterates records in load order.
    pub fn iter_original(&self) -> impl Iterator<Item = (RowKey, &Record)> + '_ {
        let generation = self.generation;
        self.records
            .iter()
            .enumerate()
            .map(move |(index, record)| (RowKey::new(generation, index as u32), record))
    }
}
