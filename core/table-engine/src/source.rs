//! FILENAME: core/table-engine/src/source.rs
//! Data sources for asynchronous ingestion.
//!
//! A source is subscribed to once. Every delivery it makes (the first one
//! and any later ones) replaces the engine's dataset. Payloads are either a
//! bare JSON array of records or an object carrying a `data` array.

use serde_json::Value;

use crate::error::{TableError, TableResult};
use crate::logging::{category, log_warn};
use crate::record::Record;

/// One delivery from a source: a JSON payload or the source's error text.
pub type Delivery = Result<Value, String>;

/// Something the engine can subscribe to for records.
pub trait DataSource {
    /// Pushes every delivery into `sink`. Sources that deliver later keep
    /// their own handle to the engine and call its load methods directly.
    fn subscribe(&mut self, sink: &mut dyn FnMut(Delivery));
}

/// A source that replays fixed deliveries when subscribed.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    deliveries: Vec<Delivery>,
}

impl StaticSource {
    pub fn new(payload: Value) -> Self {
        StaticSource {
            deliveries: vec![Ok(payload)],
        }
    }

    pub fn with_deliveries(deliveries: Vec<Delivery>) -> Self {
        StaticSource { deliveries }
    }
}

impl DataSource for StaticSource {
    fn subscribe(&mut self, sink: &mut dyn FnMut(Delivery)) {
        for delivery in self.deliveries.drain(..) {
            sink(delivery);
        }
    }
}

/// Extracts records from a payload. Non-object entries are skipped.
pub fn parse_payload(payload: &Value) -> TableResult<Vec<Record>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(object) => match object.get("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(TableError::InvalidPayload(
                    "object payload has no `data` array".to_string(),
                ))
            }
        },
        other => {
            return Err(TableError::InvalidPayload(format!(
                "expected an array or an object, got {}",
                json_kind(other)
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match Record::from_json(item) {
            Some(record) => records.push(record),
            None => log_warn!(
                category::DATA,
                "skipping entry {}: expected an object, got {}",
                index,
                json_kind(item)
            ),
        }
    }
    Ok(records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
