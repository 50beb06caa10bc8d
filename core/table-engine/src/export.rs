//! FILENAME: core/table-engine/src/export.rs
//! Export Projector - flattens records into label -> string rows.
//!
//! Export works on logical data: the current selection when there is one,
//! otherwise every loaded record in canonical order. Grouping, filtering
//! and pagination never apply. Byte encoding (CSV, XLSX) belongs to the
//! serializer that consumes these rows.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::definition::{ColumnDefinition, ExportConfig, ExportFormat};
use crate::logging::{category, log_debug};
use crate::record::{RecordStore, RowKey};
use crate::selection::SelectionLedger;

static EXTENSION_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"\.[^.]+$").ok());

const FALLBACK_FILE_PREFIX: &str = "grid-export";

// ============================================================================
// EXPORT ROW
// ============================================================================

/// One exported record: (header, text) pairs in column order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRow {
    cells: Vec<(String, String)>,
}

impl ExportRow {
    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(h, _)| h.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Serializes as a JSON object whose keys keep column order.
impl Serialize for ExportRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (header, value) in &self.cells {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Keys to export: the selection if non-empty, else the canonical order.
pub fn export_keys(ledger: &SelectionLedger, store: &RecordStore) -> Vec<RowKey> {
    let selected: Vec<RowKey> = ledger
        .selected()
        .iter()
        .copied()
        .filter(|key| store.contains(*key))
        .collect();

    if selected.is_empty() {
        store.canonical().to_vec()
    } else {
        selected
    }
}

/// Projects records through the column list. Missing and null values
/// export as the empty string.
pub fn project(store: &RecordStore, keys: &[RowKey], columns: &[ColumnDefinition]) -> Vec<ExportRow> {
    let rows: Vec<ExportRow> = keys
        .iter()
        .filter_map(|key| store.get(*key))
        .map(|record| ExportRow {
            cells: columns
                .iter()
                .map(|col| (col.header().to_string(), record.text(&col.field)))
                .collect(),
        })
        .collect();

    log_debug!(category::EXPORT, "projected {} rows over {} columns", rows.len(), columns.len());
    rows
}

// ============================================================================
// FILE NAMING AND PLAN
// ============================================================================

/// Configured file name without its extension, or `grid-export-{millis}`,
/// plus the format's extension.
pub fn export_file_name(config: &ExportConfig, format: ExportFormat, now_millis: i64) -> String {
    let base = config
        .file_name
        .as_deref()
        .map(strip_extension)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("{}-{}", FALLBACK_FILE_PREFIX, now_millis));

    format!("{}.{}", base, format.extension())
}

fn strip_extension(name: &str) -> String {
    match EXTENSION_RE.as_ref() {
        Some(re) => re.replace(name, "").into_owned(),
        None => name.to_string(),
    }
}

/// Everything a serializer needs to write one export file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPlan {
    pub format: ExportFormat,
    pub file_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<ExportRow>,
}

impl ExportPlan {
    /// Builds a plan, or None when there is nothing to export.
    pub fn new(
        format: ExportFormat,
        file_name: String,
        columns: &[ColumnDefinition],
        rows: Vec<ExportRow>,
    ) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(ExportPlan {
            format,
            file_name,
            headers: columns.iter().map(|c| c.header().to_string()).collect(),
            rows,
        })
    }
}
