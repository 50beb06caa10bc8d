//! FILENAME: core/table-engine/src/view.rs
//! Table View - the display-ready output of one recompute.
//!
//! A view is a plain owned snapshot: the current page of rows (group
//! headers, member rows, or the single no-results marker) plus the counts
//! and labels the view layer shows around the table. The view layer never
//! reaches back into the engine to render a page.
//!
//! The row presentation helpers at the bottom (classes, tooltip, track key,
//! cell text) are shared by the engine and by callers working on a
//! `TableView` directly.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::definition::{ClassList, ColumnDefinition, RowClassFn, SortSpec};
use crate::grouping::GroupNode;
use crate::pagination::PageState;
use crate::record::{Record, RowKey};
use crate::selection::{self, SelectionSummary};
use crate::value::FieldValue;

pub const DUPLICATE_TOOLTIP: &str = "Duplicate row - cannot be selected";
pub const DISABLED_TOOLTIP: &str = "Disabled row - cannot be selected";

// ============================================================================
// ROW TYPES
// ============================================================================

/// A borrowed renderable row, handed to row class functions.
#[derive(Debug, Clone, Copy)]
pub enum RowRef<'a> {
    Group(&'a GroupNode),
    Record { key: RowKey, record: &'a Record },
}

impl<'a> RowRef<'a> {
    pub fn is_group(&self) -> bool {
        matches!(self, RowRef::Group(_))
    }

    pub fn record(&self) -> Option<&'a Record> {
        match self {
            RowRef::Record { record, .. } => Some(record),
            RowRef::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&'a GroupNode> {
        match self {
            RowRef::Group(group) => Some(group),
            RowRef::Record { .. } => None,
        }
    }
}

/// A member row as it appears in a view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    pub key: RowKey,
    pub record: Record,
    pub selected: bool,
    pub selectable: bool,
}

/// One display row.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViewRow {
    Group(GroupNode),
    Record(RecordRow),
    /// The sole row of a view whose filtered set is empty.
    NoResults,
}

impl ViewRow {
    pub fn as_row_ref(&self) -> Option<RowRef<'_>> {
        match self {
            ViewRow::Group(group) => Some(RowRef::Group(group)),
            ViewRow::Record(row) => Some(RowRef::Record {
                key: row.key,
                record: &row.record,
            }),
            ViewRow::NoResults => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ViewRow::Group(_))
    }

    pub fn is_no_results(&self) -> bool {
        matches!(self, ViewRow::NoResults)
    }

    pub fn as_record(&self) -> Option<&RecordRow> {
        match self {
            ViewRow::Record(row) => Some(row),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            ViewRow::Group(group) => Some(group),
            _ => None,
        }
    }
}

// ============================================================================
// TABLE VIEW
// ============================================================================

/// The rendered output of the table engine.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableView {
    /// Current page: visible group headers and member rows, or `[NoResults]`.
    pub rows: Vec<ViewRow>,

    /// Filtered member rows before pagination (group headers excluded).
    pub total_rows: usize,

    /// "11-15 of 15" or "Showing all 15 rows".
    pub page_info: String,

    pub page: PageState,

    pub page_count: usize,

    /// Member rows covered by the current page.
    pub displayed_rows_count: usize,

    pub selection: SelectionSummary,

    /// Outcome of the last row-level action, cleared by selection changes.
    pub status_message: Option<String>,

    /// "group", "select", then the visible column fields.
    pub displayed_columns: Vec<String>,

    pub group_by: Vec<String>,

    pub sort: Option<SortSpec>,

    pub search_text: String,
}

impl TableView {
    pub fn has_no_results(&self) -> bool {
        self.total_rows == 0
    }

    pub fn group_rows(&self) -> impl Iterator<Item = &GroupNode> {
        self.rows.iter().filter_map(ViewRow::as_group)
    }

    pub fn record_rows(&self) -> impl Iterator<Item = &RecordRow> {
        self.rows.iter().filter_map(ViewRow::as_record)
    }
}

// ============================================================================
// ROW PRESENTATION
// ============================================================================

/// Class map for a row: built-in state classes, then the row class function.
pub fn row_classes(
    row: RowRef<'_>,
    index: usize,
    selected: bool,
    selectable: bool,
    row_class_function: Option<&RowClassFn>,
) -> BTreeMap<String, bool> {
    let mut classes = BTreeMap::new();

    match row {
        RowRef::Group(_) => {
            classes.insert("group-row".to_string(), true);
        }
        RowRef::Record { record, .. } => {
            if selected {
                classes.insert("selected-row".to_string(), true);
            }
            if !selectable {
                classes.insert("row-disabled".to_string(), true);
            }
            let duplicate = selection::is_duplicate(record);
            if duplicate {
                classes.insert("duplicate-row".to_string(), true);
            }
            if selection::is_disabled(record) && !duplicate {
                classes.insert("disabled-row".to_string(), true);
            }
        }
    }

    if let Some(f) = row_class_function {
        (f.get())(row, index).merge_into(&mut classes);
    }
    classes
}

/// Why a member row cannot be selected (empty for groups and plain rows).
pub fn row_tooltip(row: RowRef<'_>) -> &'static str {
    match row.record() {
        Some(record) if selection::is_duplicate(record) => DUPLICATE_TOOLTIP,
        Some(record) if selection::is_disabled(record) => DISABLED_TOOLTIP,
        _ => "",
    }
}

/// Stable key for incremental rendering: `group-{level}-{path}` for groups,
/// the identity text (or the position) for member rows.
pub fn track_key(row: RowRef<'_>, index: usize, identity_field: &str) -> String {
    match row {
        RowRef::Group(group) => format!("group-{}-{}", group.level, group.key),
        RowRef::Record { record, .. } => {
            let identity = record.get(identity_field);
            if identity.is_truthy() {
                identity.display_text()
            } else {
                index.to_string()
            }
        }
    }
}

/// The value a cell shows: the cell value function result (or the raw
/// field), passed through the column format.
pub fn cell_value(record: &Record, column: &ColumnDefinition, index: usize) -> String {
    let raw = record.get(&column.field);
    let value = match &column.cell_value_function {
        Some(f) => (f.get())(record, raw, column, index),
        None => raw.clone(),
    };
    format_value(&value, column)
}

fn format_value(value: &FieldValue, column: &ColumnDefinition) -> String {
    match &column.format {
        Some(format) => (format.get())(value),
        None => value.display_text(),
    }
}

/// Classes from the column's cell class function.
pub fn cell_classes(record: &Record, column: &ColumnDefinition, index: usize) -> BTreeMap<String, bool> {
    let mut classes = BTreeMap::new();
    if let Some(f) = &column.cell_class_function {
        let raw = record.get(&column.field);
        (f.get())(record, raw, column, index).merge_into(&mut classes);
    }
    classes
}

/// Shorthand for a single custom class.
pub fn class(name: &str) -> ClassList {
    ClassList::One(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::TableConfiguration;
    use crate::grouping::GroupPathKey;
    use smallvec::smallvec;

    fn group() -> GroupNode {
        GroupNode {
            level: 1,
            field: "brand".to_string(),
            values: smallvec!["BMW".to_string()],
            key: GroupPathKey::from_values(["BMW"]),
            member_count: 2,
            expanded: true,
            visible: true,
            parent: None,
        }
    }

    #[test]
    fn test_row_classes_for_flags() {
        let record = Record::new().with("isDuplicate", true).with("disabled", true);
        let row = RowRef::Record {
            key: RowKey::new(1, 0),
            record: &record,
        };
        let classes = row_classes(row, 0, false, false, None);
        assert!(classes.contains_key("duplicate-row"));
        assert!(classes.contains_key("row-disabled"));
        assert!(!classes.contains_key("disabled-row"));
        assert_eq!(row_tooltip(row), DUPLICATE_TOOLTIP);
    }

    #[test]
    fn test_row_class_function_is_merged() {
        let config = TableConfiguration::new(vec![ColumnDefinition::new("a", "A")])
            .with_row_class_function(|row, index| {
                if row.is_group() {
                    class("header")
                } else {
                    ClassList::Many(vec![format!("row-{}", index)])
                }
            });
        let group = group();
        let classes = row_classes(
            RowRef::Group(&group),
            3,
            false,
            false,
            config.row_class_function.as_ref(),
        );
        assert!(classes.contains_key("group-row"));
        assert!(classes.contains_key("header"));
    }

    #[test]
    fn test_track_keys() {
        let group = group();
        assert_eq!(track_key(RowRef::Group(&group), 0, "id"), "group-1-BMW");

        let with_id = Record::new().with("id", 7);
        let without = Record::new();
        let key = RowKey::new(1, 0);
        assert_eq!(track_key(RowRef::Record { key, record: &with_id }, 4, "id"), "7");
        assert_eq!(track_key(RowRef::Record { key, record: &without }, 4, "id"), "4");
    }

    #[test]
    fn test_cell_value_applies_function_then_format() {
        let column = ColumnDefinition::new("price", "Price")
            .with_cell_value_function(|_, raw, _, _| {
                FieldValue::Number(raw.as_number().unwrap_or(0.0) * 2.0)
            })
            .with_format(|v| format!("${}", v.display_text()));
        let record = Record::new().with("price", 21);
        assert_eq!(cell_value(&record, &column, 0), "$42");
    }

    #[test]
    fn test_no_results_serializes_with_kind_tag() {
        let json = serde_json::to_value(ViewRow::NoResults).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "noResults" }));
    }
}
