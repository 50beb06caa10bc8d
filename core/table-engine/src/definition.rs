//! FILENAME: core/table-engine/src/definition.rs
//! Table Definition - The declarative configuration.
//!
//! This module contains all the types needed to DESCRIBE a table.
//! These structures are designed to be:
//! - Deserializable from the JSON configuration contract (camelCase keys)
//! - Immutable once handed to the engine
//! - Carriers of caller-supplied strategies (predicates, class and value
//!   functions), which are skipped by serde and attached with builders

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, TableResult};
use crate::logging::{category, log_warn};
use crate::record::Record;
use crate::value::FieldValue;
use crate::view::RowRef;

/// Index of a column in `TableConfiguration::columns`.
pub type ColumnIndex = usize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 5] = [5, 10, 25, 50, 100];
pub const DEFAULT_IDENTITY_FIELD: &str = "id";

fn default_true() -> bool {
    true
}

fn default_identity_field() -> String {
    DEFAULT_IDENTITY_FIELD.to_string()
}

// ============================================================================
// CALLBACKS
// ============================================================================

/// A caller-supplied strategy held by the configuration.
/// Invoked synchronously; the engine does not guard against panics in it.
pub struct Callback<F: ?Sized>(Arc<F>);

impl<F: ?Sized> Callback<F> {
    pub fn get(&self) -> &F {
        &self.0
    }
}

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Callback(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Classes produced by a class function: a single name, a list, or a
/// name -> enabled map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassList {
    One(String),
    Many(Vec<String>),
    Map(BTreeMap<String, bool>),
}

impl ClassList {
    /// Merges these classes into a class map.
    pub fn merge_into(self, classes: &mut BTreeMap<String, bool>) {
        match self {
            ClassList::One(name) => {
                classes.insert(name, true);
            }
            ClassList::Many(names) => {
                for name in names {
                    classes.insert(name, true);
                }
            }
            ClassList::Map(map) => classes.extend(map),
        }
    }
}

pub type FormatFn = Callback<dyn Fn(&FieldValue) -> String + Send + Sync>;
pub type CellValueFn =
    Callback<dyn Fn(&Record, &FieldValue, &ColumnDefinition, usize) -> FieldValue + Send + Sync>;
pub type CellClassFn =
    Callback<dyn Fn(&Record, &FieldValue, &ColumnDefinition, usize) -> ClassList + Send + Sync>;
pub type RowClassFn = Callback<dyn Fn(RowRef<'_>, usize) -> ClassList + Send + Sync>;
pub type SelectablePredicate = Callback<dyn Fn(&Record) -> bool + Send + Sync>;

// ============================================================================
// COLUMNS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
    Center,
}

/// A column width: bare numbers are pixels, strings are passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnWidth {
    Pixels(f64),
    Css(String),
}

impl ColumnWidth {
    pub fn to_css(&self) -> String {
        match self {
            ColumnWidth::Pixels(px) => format!("{}px", FieldValue::Number(*px).display_text()),
            ColumnWidth::Css(s) => s.clone(),
        }
    }
}

/// Describes one column of the table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    /// Record field this column reads.
    pub field: String,

    /// Header label (falls back to the field name when empty).
    #[serde(default)]
    pub label: String,

    #[serde(default = "default_true")]
    pub sortable: bool,

    #[serde(default = "default_true")]
    pub filterable: bool,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default)]
    pub resizable: bool,

    #[serde(default)]
    pub width: Option<ColumnWidth>,

    #[serde(default)]
    pub min_width: Option<ColumnWidth>,

    #[serde(default)]
    pub max_width: Option<ColumnWidth>,

    #[serde(default)]
    pub align: Option<Alignment>,

    /// Name of a custom cell template. Opaque to the engine.
    #[serde(default)]
    pub cell_template: Option<String>,

    #[serde(skip)]
    pub format: Option<FormatFn>,

    #[serde(skip)]
    pub cell_value_function: Option<CellValueFn>,

    #[serde(skip)]
    pub cell_class_function: Option<CellClassFn>,
}

impl ColumnDefinition {
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        ColumnDefinition {
            field: field.into(),
            label: label.into(),
            sortable: true,
            filterable: true,
            visible: true,
            resizable: false,
            width: None,
            min_width: None,
            max_width: None,
            align: None,
            cell_template: None,
            format: None,
            cell_value_function: None,
            cell_class_function: None,
        }
    }

    /// The header used for display and export.
    pub fn header(&self) -> &str {
        if self.label.is_empty() {
            &self.field
        } else {
            &self.label
        }
    }

    /// CSS width, "auto" when unset.
    pub fn width_css(&self) -> String {
        self.width
            .as_ref()
            .map(ColumnWidth::to_css)
            .unwrap_or_else(|| "auto".to_string())
    }

    pub fn with_format<F>(mut self, f: F) -> Self
    where
        F: Fn(&FieldValue) -> String + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(&FieldValue) -> String + Send + Sync> = Arc::new(f);
        self.format = Some(Callback(f));
        self
    }

    pub fn with_cell_value_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record, &FieldValue, &ColumnDefinition, usize) -> FieldValue + Send + Sync + 'static,
    {
        let f: Arc<
            dyn Fn(&Record, &FieldValue, &ColumnDefinition, usize) -> FieldValue + Send + Sync,
        > = Arc::new(f);
        self.cell_value_function = Some(Callback(f));
        self
    }

    pub fn with_cell_class_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record, &FieldValue, &ColumnDefinition, usize) -> ClassList + Send + Sync + 'static,
    {
        let f: Arc<
            dyn Fn(&Record, &FieldValue, &ColumnDefinition, usize) -> ClassList + Send + Sync,
        > = Arc::new(f);
        self.cell_class_function = Some(Callback(f));
        self
    }
}

// ============================================================================
// FEATURE VOCABULARY
// ============================================================================

/// Per-column filter operators. All comparisons are case-insensitive and
/// operate on the display text of the field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum FilterOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    NotContains,
    NotEquals,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 6] = [
        FilterOperator::Contains,
        FilterOperator::Equals,
        FilterOperator::StartsWith,
        FilterOperator::EndsWith,
        FilterOperator::NotContains,
        FilterOperator::NotEquals,
    ];

    /// Wire name, e.g. "startsWith".
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::Equals => "equals",
            FilterOperator::StartsWith => "startsWith",
            FilterOperator::EndsWith => "endsWith",
            FilterOperator::NotContains => "notContains",
            FilterOperator::NotEquals => "notEquals",
        }
    }

    /// Parses a wire name. Unknown names fall back to `Contains`.
    pub fn parse(name: &str) -> Self {
        match FilterOperator::ALL.iter().copied().find(|op| op.as_str() == name) {
            Some(op) => op,
            None => {
                log_warn!(category::CONFIG, "unknown filter operator {:?}, using contains", name);
                FilterOperator::Contains
            }
        }
    }

    pub fn default_label(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "Contains",
            FilterOperator::Equals => "Equals",
            FilterOperator::StartsWith => "Starts with",
            FilterOperator::EndsWith => "Ends with",
            FilterOperator::NotContains => "Does not contain",
            FilterOperator::NotEquals => "Does not equal",
        }
    }
}

impl From<String> for FilterOperator {
    fn from(name: String) -> Self {
        FilterOperator::parse(&name)
    }
}

impl Default for FilterOperator {
    fn default() -> Self {
        FilterOperator::Contains
    }
}

/// An operator offered to the user together with its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOperatorOption {
    pub value: FilterOperator,
    pub label: String,
}

pub fn default_filter_operators() -> Vec<FilterOperatorOption> {
    FilterOperator::ALL
        .iter()
        .map(|op| FilterOperatorOption {
            value: *op,
            label: op.default_label().to_string(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// The active sort: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub active: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(active: impl Into<String>, direction: SortDirection) -> Self {
        SortSpec {
            active: active.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Xls,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xls => "xls",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

// ============================================================================
// SUB-CONFIGURATIONS
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    pub enabled: bool,
    #[serde(default)]
    pub default_page_size: Option<usize>,
    #[serde(default)]
    pub page_size_options: Option<Vec<usize>>,
    #[serde(default)]
    pub show_first_last_buttons: bool,
}

impl PaginationConfig {
    pub fn page_size(&self) -> usize {
        self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn size_options(&self) -> Vec<usize> {
        self.page_size_options
            .clone()
            .unwrap_or_else(|| DEFAULT_PAGE_SIZE_OPTIONS.to_vec())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupingConfig {
    pub enabled: bool,
    #[serde(default)]
    pub default_group_by_columns: Vec<String>,
    #[serde(default = "default_true")]
    pub expand_all_by_default: bool,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig {
            enabled: false,
            default_group_by_columns: Vec::new(),
            expand_all_by_default: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortingConfig {
    pub enabled: bool,
    #[serde(default)]
    pub default_sort: Option<SortSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteringConfig {
    pub enabled: bool,
    #[serde(default)]
    pub global_search_enabled: bool,
    #[serde(default)]
    pub column_filters_enabled: bool,
    #[serde(default)]
    pub filter_operators: Option<Vec<FilterOperatorOption>>,
}

impl FilteringConfig {
    pub fn operators(&self) -> Vec<FilterOperatorOption> {
        self.filter_operators
            .clone()
            .unwrap_or_else(default_filter_operators)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub multi_select: bool,
    #[serde(skip)]
    pub selectable_row_predicate: Option<SelectablePredicate>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        SelectionConfig {
            enabled: false,
            multi_select: true,
            selectable_row_predicate: None,
        }
    }
}

impl SelectionConfig {
    pub fn with_selectable_row_predicate<F>(mut self, f: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(&Record) -> bool + Send + Sync> = Arc::new(f);
        self.selectable_row_predicate = Some(Callback(f));
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    pub enabled: bool,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<ExportFormat>>,
    #[serde(default)]
    pub default_format: Option<ExportFormat>,
}

impl ExportConfig {
    pub fn available_formats(&self) -> Vec<ExportFormat> {
        self.formats
            .clone()
            .unwrap_or_else(|| vec![ExportFormat::Csv, ExportFormat::Xlsx])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnVisibilityConfig {
    pub enabled: bool,
    #[serde(default)]
    pub default_visible_columns: Option<Vec<String>>,
}

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// The complete declarative contract for one table instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfiguration {
    /// Ordered columns. Must be non-empty with unique field names.
    pub columns: Vec<ColumnDefinition>,

    #[serde(default)]
    pub pagination: Option<PaginationConfig>,

    #[serde(default)]
    pub grouping: Option<GroupingConfig>,

    #[serde(default)]
    pub sorting: Option<SortingConfig>,

    #[serde(default)]
    pub filtering: Option<FilteringConfig>,

    #[serde(default)]
    pub selection: Option<SelectionConfig>,

    #[serde(default)]
    pub export: Option<ExportConfig>,

    #[serde(default)]
    pub column_visibility: Option<ColumnVisibilityConfig>,

    /// Field carrying record identity; backfilled on load when absent.
    #[serde(default = "default_identity_field")]
    pub identity_field: String,

    #[serde(skip)]
    pub row_class_function: Option<RowClassFn>,
}

impl Default for TableConfiguration {
    fn default() -> Self {
        TableConfiguration {
            columns: Vec::new(),
            pagination: None,
            grouping: None,
            sorting: None,
            filtering: None,
            selection: None,
            export: None,
            column_visibility: None,
            identity_field: default_identity_field(),
            row_class_function: None,
        }
    }
}

impl TableConfiguration {
    /// Creates a configuration with the given columns and every feature off.
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        TableConfiguration {
            columns,
            ..Default::default()
        }
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> TableResult<Self> {
        let config: TableConfiguration = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> TableResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Minimal structural checks: columns exist, fields are non-empty and
    /// unique, page size is positive.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.columns.is_empty() {
            return Err(ConfigurationError::NoColumns);
        }

        let mut seen = FxHashSet::default();
        for (index, column) in self.columns.iter().enumerate() {
            if column.field.is_empty() {
                return Err(ConfigurationError::EmptyFieldName(index));
            }
            if !seen.insert(column.field.as_str()) {
                return Err(ConfigurationError::DuplicateField(column.field.clone()));
            }
        }

        if let Some(pagination) = &self.pagination {
            if pagination.default_page_size == Some(0) {
                return Err(ConfigurationError::InvalidPageSize);
            }
        }

        Ok(())
    }

    pub fn with_row_class_function<F>(mut self, f: F) -> Self
    where
        F: Fn(RowRef<'_>, usize) -> ClassList + Send + Sync + 'static,
    {
        let f: Arc<dyn Fn(RowRef<'_>, usize) -> ClassList + Send + Sync> = Arc::new(f);
        self.row_class_function = Some(Callback(f));
        self
    }

    pub fn column(&self, field: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn column_index(&self, field: &str) -> Option<ColumnIndex> {
        self.columns.iter().position(|c| c.field == field)
    }

    // ------------------------------------------------------------------------
    // Feature switches
    // ------------------------------------------------------------------------

    pub fn pagination_enabled(&self) -> bool {
        self.pagination.as_ref().is_some_and(|p| p.enabled)
    }

    pub fn grouping_enabled(&self) -> bool {
        self.grouping.as_ref().is_some_and(|g| g.enabled)
    }

    pub fn sorting_enabled(&self) -> bool {
        self.sorting.as_ref().is_some_and(|s| s.enabled)
    }

    pub fn filtering_enabled(&self) -> bool {
        self.filtering.as_ref().is_some_and(|f| f.enabled)
    }

    pub fn selection_enabled(&self) -> bool {
        self.selection.as_ref().is_some_and(|s| s.enabled)
    }

    pub fn export_enabled(&self) -> bool {
        self.export.as_ref().is_some_and(|e| e.enabled)
    }

    pub fn column_visibility_enabled(&self) -> bool {
        self.column_visibility.as_ref().is_some_and(|c| c.enabled)
    }

    pub fn expand_all_by_default(&self) -> bool {
        self.grouping
            .as_ref()
            .map(|g| g.expand_all_by_default)
            .unwrap_or(true)
    }

    pub fn multi_select(&self) -> bool {
        self.selection.as_ref().map(|s| s.multi_select).unwrap_or(true)
    }

    /// The configured default sort, when sorting is enabled.
    pub fn default_sort(&self) -> Option<&SortSpec> {
        self.sorting
            .as_ref()
            .filter(|s| s.enabled)
            .and_then(|s| s.default_sort.as_ref())
    }

    /// The configured default group-by fields, when grouping is enabled.
    pub fn default_group_by(&self) -> Vec<String> {
        self.grouping
            .as_ref()
            .filter(|g| g.enabled)
            .map(|g| g.default_group_by_columns.clone())
            .unwrap_or_default()
    }

    /// The operator catalogue offered by the column filters.
    pub fn filter_operators(&self) -> Vec<FilterOperatorOption> {
        self.filtering
            .as_ref()
            .map(FilteringConfig::operators)
            .unwrap_or_else(default_filter_operators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_columns() {
        let config = TableConfiguration::new(Vec::new());
        assert_eq!(config.validate(), Err(ConfigurationError::NoColumns));
    }

    #[test]
    fn test_validate_rejects_duplicate_fields() {
        let config = TableConfiguration::new(vec![
            ColumnDefinition::new("brand", "Brand"),
            ColumnDefinition::new("brand", "Make"),
        ]);
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::DuplicateField("brand".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = TableConfiguration::new(vec![ColumnDefinition::new("a", "A")]);
        config.pagination = Some(PaginationConfig {
            enabled: true,
            default_page_size: Some(0),
            ..Default::default()
        });
        assert_eq!(config.validate(), Err(ConfigurationError::InvalidPageSize));
    }

    #[test]
    fn test_json_contract_defaults() {
        let json = r#"{
            "columns": [
                { "field": "id", "label": "ID", "width": "80px", "filterable": false },
                { "field": "year", "label": "Year", "width": 100 }
            ],
            "grouping": { "enabled": true, "defaultGroupByColumns": ["brand"] },
            "sorting": { "enabled": true, "defaultSort": { "active": "id", "direction": "asc" } },
            "filtering": { "enabled": true, "globalSearchEnabled": true }
        }"#;

        let config = TableConfiguration::from_json_str(json).unwrap();

        assert_eq!(config.identity_field, "id");
        assert!(!config.columns[0].filterable);
        assert!(config.columns[1].sortable);
        assert_eq!(config.columns[0].width_css(), "80px");
        assert_eq!(config.columns[1].width_css(), "100px");
        assert!(config.expand_all_by_default());
        assert_eq!(config.default_group_by(), vec!["brand".to_string()]);
        assert_eq!(
            config.default_sort(),
            Some(&SortSpec::new("id", SortDirection::Asc))
        );
        assert_eq!(config.filter_operators().len(), 6);
        assert!(!config.pagination_enabled());
    }

    #[test]
    fn test_unknown_operator_parses_as_contains() {
        assert_eq!(FilterOperator::parse("startsWith"), FilterOperator::StartsWith);
        assert_eq!(FilterOperator::parse("regex"), FilterOperator::Contains);

        let op: FilterOperator = serde_json::from_str("\"regex\"").unwrap();
        assert_eq!(op, FilterOperator::Contains);
        let op: FilterOperator = serde_json::from_str("\"notEquals\"").unwrap();
        assert_eq!(op, FilterOperator::NotEquals);
        assert_eq!(serde_json::to_string(&FilterOperator::EndsWith).unwrap(), "\"endsWith\"");
    }

    #[test]
    fn test_default_configuration_has_identity_field() {
        assert_eq!(TableConfiguration::default().identity_field, "id");
        assert_eq!(TableConfiguration::new(Vec::new()).identity_field, "id");
    }

    #[test]
    fn test_header_falls_back_to_field() {
        let column = ColumnDefinition::new("vin", "");
        assert_eq!(column.header(), "vin");
    }
}
