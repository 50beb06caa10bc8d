//! FILENAME: core/table-engine/src/filter.rs
//! Filter Pipeline - global search and per-column operator filters.
//!
//! The pipeline keeps the last result keyed by a filter signature
//! (normalized search text + serialized column filters). Recomputations
//! triggered by unrelated state (pagination, expansion, selection) hit the
//! cache. The signature does not cover the record set, so callers must
//! `invalidate()` whenever the data or its canonical order changes.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::definition::{ColumnDefinition, FilterOperator, FilteringConfig};
use crate::logging::{category, log_debug};
use crate::record::{Record, RecordStore, RowKey};

// ============================================================================
// FILTER STATE
// ============================================================================

/// One column's filter: an operator and the raw user-entered value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub operator: FilterOperator,
    pub value: String,
}

impl ColumnFilter {
    pub fn new(operator: FilterOperator, value: impl Into<String>) -> Self {
        ColumnFilter {
            operator,
            value: value.into(),
        }
    }

    /// A filter with a blank (whitespace-only) value is inactive.
    pub fn is_active(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

/// Search text plus per-field column filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    pub search_text: String,
    pub column_filters: BTreeMap<String, ColumnFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        FilterState::default()
    }

    /// Lowercased, trimmed search text.
    pub fn normalized_search(&self) -> String {
        self.search_text.trim().to_lowercase()
    }

    pub fn column_filter(&self, field: &str) -> Option<&ColumnFilter> {
        self.column_filters.get(field)
    }

    /// Operator for a field (Contains when the field has no filter yet).
    pub fn operator(&self, field: &str) -> FilterOperator {
        self.column_filters
            .get(field)
            .map(|f| f.operator)
            .unwrap_or_default()
    }

    pub fn set_column_filter(&mut self, field: &str, operator: FilterOperator, value: &str) {
        self.column_filters
            .insert(field.to_string(), ColumnFilter::new(operator, value));
    }

    pub fn set_column_value(&mut self, field: &str, value: &str) {
        self.column_filters.entry(field.to_string()).or_default().value = value.to_string();
    }

    pub fn set_column_operator(&mut self, field: &str, operator: FilterOperator) {
        self.column_filters.entry(field.to_string()).or_default().operator = operator;
    }

    /// Resets a field to Contains with an empty value.
    pub fn clear_column(&mut self, field: &str) {
        self.column_filters
            .insert(field.to_string(), ColumnFilter::default());
    }

    pub fn clear_all_columns(&mut self) {
        for filter in self.column_filters.values_mut() {
            *filter = ColumnFilter::default();
        }
    }

    pub fn has_column_filter(&self, field: &str) -> bool {
        self.column_filters.get(field).is_some_and(ColumnFilter::is_active)
    }

    pub fn has_any_column_filter(&self) -> bool {
        self.column_filters.values().any(ColumnFilter::is_active)
    }

    /// The cache signature of this state.
    pub fn cache_key(&self) -> String {
        let filters = serde_json::to_string(&self.column_filters).unwrap_or_default();
        format!("{}|{}", self.normalized_search(), filters)
    }
}

// ============================================================================
// MATCHING
// ============================================================================

/// Applies one operator to already-lowercased operands.
pub fn operator_matches(operator: FilterOperator, item: &str, needle: &str) -> bool {
    match operator {
        FilterOperator::Contains => item.contains(needle),
        FilterOperator::Equals => item == needle,
        FilterOperator::StartsWith => item.starts_with(needle),
        FilterOperator::EndsWith => item.ends_with(needle),
        FilterOperator::NotContains => !item.contains(needle),
        FilterOperator::NotEquals => item != needle,
    }
}

/// True if any column's text contains the (lowercased) search term.
pub fn matches_search(record: &Record, columns: &[ColumnDefinition], needle: &str) -> bool {
    columns
        .iter()
        .any(|col| record.text(&col.field).to_lowercase().contains(needle))
}

/// True if every active column filter matches.
pub fn matches_column_filters(
    record: &Record,
    columns: &[ColumnDefinition],
    filters: &BTreeMap<String, ColumnFilter>,
) -> bool {
    for col in columns {
        let filter = match filters.get(&col.field) {
            Some(f) if f.is_active() => f,
            _ => continue,
        };
        let item = record.text(&col.field).to_lowercase();
        let needle = filter.value.trim().to_lowercase();
        if !operator_matches(filter.operator, &item, &needle) {
            return false;
        }
    }
    true
}

// ============================================================================
// PIPELINE
// ============================================================================

#[derive(Debug)]
struct FilterCache {
    key: String,
    rows: Arc<[RowKey]>,
}

/// Filters the canonical record order, caching the last result.
#[derive(Debug, Default)]
pub struct FilterPipeline {
    cache: Option<FilterCache>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        FilterPipeline::default()
    }

    /// Drops the cached result.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// True if a cached result exists for exactly this state.
    pub fn is_cached_for(&self, state: &FilterState) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|c| c.key == state.cache_key())
    }

    /// Returns the canonical rows that pass the filters, preserving order.
    pub fn apply(
        &mut self,
        store: &RecordStore,
        state: &FilterState,
        columns: &[ColumnDefinition],
        config: Option<&FilteringConfig>,
    ) -> Arc<[RowKey]> {
        let config = match config {
            Some(c) if c.enabled => c,
            _ => return Arc::from(store.canonical()),
        };

        let key = state.cache_key();
        if let Some(cache) = &self.cache {
            if cache.key == key {
                return Arc::clone(&cache.rows);
            }
        }

        let search = if config.global_search_enabled {
            state.normalized_search()
        } else {
            String::new()
        };
        let use_column_filters = config.column_filters_enabled && state.has_any_column_filter();

        let rows: Arc<[RowKey]> = store
            .iter_canonical()
            .filter(|(_, record)| search.is_empty() || matches_search(record, columns, &search))
            .filter(|(_, record)| {
                !use_column_filters || matches_column_filters(record, columns, &state.column_filters)
            })
            .map(|(key, _)| key)
            .collect();

        log_debug!(
            category::FILTER,
            "filtered {} of {} rows (search={:?}, column_filters={})",
            rows.len(),
            store.len(),
            search,
            use_column_filters
        );

        self.cache = Some(FilterCache {
            key,
            rows: Arc::clone(&rows),
        });
        rows
    }
}
