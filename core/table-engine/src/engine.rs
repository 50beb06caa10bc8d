//! FILENAME: core/table-engine/src/engine.rs
//! Table Engine - stateful orchestration of every stage.
//!
//! The engine owns one table instance: its configuration, the loaded
//! records, and all interaction state (filters, sort, group-by, expansion,
//! page, selection, column visibility). `get_view()` turns that state into a
//! `TableView`.
//!
//! Recompute pipeline:
//! 1. Sort stage rewrites the canonical order when the sort changes
//! 2. Filter pipeline narrows the canonical order (cached by signature)
//! 3. Group tree is built from the filtered rows, expansion resolved by key
//! 4. Visibility resolver marks what renders
//! 5. Pagination slices the visible sequence
//!
//! Steps 2-4 only rerun when data, sort, filters or group-by change.
//! Expanding or collapsing a group updates the existing tree and reruns
//! step 4 alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::definition::{
    ColumnDefinition, ExportFormat, FilterOperator, FilterOperatorOption, SortSpec,
    TableConfiguration,
};
use crate::error::{TableError, TableResult};
use crate::expansion::ExpansionStore;
use crate::export::{self, ExportPlan, ExportRow};
use crate::filter::{FilterPipeline, FilterState};
use crate::grouping::{FlatEntry, GroupPathKey, GroupTree};
use crate::logging::{category, log_debug, log_enter, log_error, log_exit, log_info, log_warn};
use crate::pagination::PageState;
use crate::record::{Record, RecordStore, RowKey};
use crate::selection::{self, RowAction, SelectionLedger, SelectionSummary};
use crate::sort;
use crate::source::{self, DataSource};
use crate::view::{self, RecordRow, RowRef, TableView, ViewRow};
use crate::visibility;

/// Leading pseudo-column shown while grouping is active.
pub const GROUP_COLUMN: &str = "group";
/// Pseudo-column holding the selection checkboxes.
pub const SELECT_COLUMN: &str = "select";

/// One table instance.
#[derive(Debug)]
pub struct TableEngine {
    config: Option<TableConfiguration>,

    store: RecordStore,

    filter_state: FilterState,
    filter: FilterPipeline,

    sort: Option<SortSpec>,

    group_by: Vec<String>,
    expansion: ExpansionStore,

    /// Last filtered row set (canonical order).
    filtered: Arc<[RowKey]>,
    tree: GroupTree,
    /// Set whenever filtered rows or the tree structure must be rebuilt.
    stale: bool,

    page: PageState,
    selection: SelectionLedger,
    column_visibility: FxHashMap<String, bool>,
    status_message: Option<String>,
}

impl Default for TableEngine {
    fn default() -> Self {
        TableEngine {
            config: None,
            store: RecordStore::new(),
            filter_state: FilterState::new(),
            filter: FilterPipeline::new(),
            sort: None,
            group_by: Vec::new(),
            expansion: ExpansionStore::new(),
            filtered: Arc::from(Vec::new()),
            tree: GroupTree::default(),
            stale: true,
            page: PageState::default(),
            selection: SelectionLedger::new(),
            column_visibility: FxHashMap::default(),
            status_message: None,
        }
    }
}

impl TableEngine {
    /// Creates an unconfigured engine.
    pub fn new() -> Self {
        TableEngine::default()
    }

    /// Creates an engine and configures it.
    pub fn with_config(config: TableConfiguration) -> TableResult<Self> {
        let mut engine = TableEngine::new();
        engine.configure(config)?;
        Ok(engine)
    }

    // ========================================================================
    // CONFIGURATION
    // ========================================================================

    /// Installs a configuration and resets every piece of interaction state.
    /// Already-loaded records are kept and re-sorted by the default sort.
    pub fn configure(&mut self, config: TableConfiguration) -> TableResult<()> {
        config.validate()?;

        self.column_visibility = config
            .columns
            .iter()
            .map(|col| {
                let visible = match config
                    .column_visibility
                    .as_ref()
                    .and_then(|cv| cv.default_visible_columns.as_ref())
                {
                    Some(defaults) => defaults.contains(&col.field),
                    None => col.visible,
                };
                (col.field.clone(), visible)
            })
            .collect();

        self.filter_state = FilterState::new();
        self.filter.invalidate();
        self.sort = config.default_sort().cloned();
        self.group_by = config.default_group_by();
        self.expansion = ExpansionStore::new();
        self.page = PageState::from_config(config.pagination.as_ref());
        self.selection.clear();
        self.status_message = None;

        log_info!(
            category::CONFIG,
            "configured {} columns (sort={:?}, group_by={:?})",
            config.columns.len(),
            self.sort,
            self.group_by
        );

        self.config = Some(config);
        sort::apply_sort(&mut self.store, self.sort.as_ref());
        self.stale = true;
        Ok(())
    }

    pub fn config(&self) -> Option<&TableConfiguration> {
        self.config.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    fn require_config(&self) -> TableResult<&TableConfiguration> {
        self.config.as_ref().ok_or(TableError::NotConfigured)
    }

    /// True when the configured feature switch is on.
    fn feature(&self, check: impl Fn(&TableConfiguration) -> bool) -> bool {
        self.config.as_ref().is_some_and(check)
    }

    fn columns(&self) -> &[ColumnDefinition] {
        self.config.as_ref().map(|c| c.columns.as_slice()).unwrap_or(&[])
    }

    // ========================================================================
    // DATA
    // ========================================================================

    /// Replaces the dataset. Missing identities are backfilled with
    /// `position + 1`; the active sort is re-applied and every cache dropped.
    /// Returns the number of records loaded.
    pub fn load(&mut self, records: Vec<Record>) -> TableResult<usize> {
        let identity_field = self.require_config()?.identity_field.clone();

        let backfilled = self.store.replace(records, &identity_field);
        sort::apply_sort(&mut self.store, self.sort.as_ref());
        self.filter.invalidate();
        let dropped = self.selection.prune(&self.store);
        self.stale = true;

        log_info!(
            category::DATA,
            "loaded {} records ({} identities backfilled, {} stale selections dropped)",
            self.store.len(),
            backfilled,
            dropped
        );
        Ok(self.store.len())
    }

    /// Loads a JSON payload: an array of records or `{ "data": [...] }`.
    pub fn load_json(&mut self, payload: &serde_json::Value) -> TableResult<usize> {
        self.require_config()?;
        let records = source::parse_payload(payload)?;
        self.load(records)
    }

    pub fn load_json_str(&mut self, json: &str) -> TableResult<usize> {
        let payload: serde_json::Value = serde_json::from_str(json)?;
        self.load_json(&payload)
    }

    /// Subscribes to `source`. Each delivery replaces the dataset; failed
    /// deliveries are logged and leave the current data in place.
    /// Returns the number of deliveries that were applied.
    pub fn load_async(&mut self, source: &mut dyn DataSource) -> TableResult<usize> {
        self.require_config()?;

        let mut applied = 0;
        source.subscribe(&mut |delivery| match delivery {
            Ok(payload) => match self.load_json(&payload) {
                Ok(_) => applied += 1,
                Err(e) => log_error!(category::DATA, "rejected data source payload: {}", e),
            },
            Err(e) => log_error!(category::DATA, "data source error: {}", e),
        });
        Ok(applied)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn record(&self, key: RowKey) -> Option<&Record> {
        self.store.get(key)
    }

    // ========================================================================
    // SORTING
    // ========================================================================

    /// Sets or clears (None) the sort. No-op when sorting is disabled or the
    /// column is marked unsortable.
    pub fn set_sort(&mut self, sort: Option<SortSpec>) {
        if !self.feature(TableConfiguration::sorting_enabled) {
            log_debug!(category::SORT, "sorting disabled, ignoring set_sort");
            return;
        }
        if let Some(spec) = &sort {
            let unsortable = self
                .config
                .as_ref()
                .and_then(|c| c.column(&spec.active))
                .is_some_and(|col| !col.sortable);
            if unsortable {
                log_debug!(category::SORT, "column {} is not sortable", spec.active);
                return;
            }
        }

        sort::apply_sort(&mut self.store, sort.as_ref());
        self.sort = sort;
        self.filter.invalidate();
        self.stale = true;
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    // ========================================================================
    // GROUPING & EXPANSION
    // ========================================================================

    /// Replaces the group-by field list. Expansion memory is kept.
    pub fn set_group_by(&mut self, fields: Vec<String>) {
        if !self.feature(TableConfiguration::grouping_enabled) {
            log_debug!(category::GROUP, "grouping disabled, ignoring set_group_by");
            return;
        }
        self.group_by = fields;
        self.stale = true;
    }

    /// Appends `field` to the group-by list, or removes it if present.
    pub fn toggle_group_by(&mut self, field: &str) {
        if !self.feature(TableConfiguration::grouping_enabled) {
            return;
        }
        match self.group_by.iter().position(|f| f == field) {
            Some(pos) => {
                self.group_by.remove(pos);
            }
            None => self.group_by.push(field.to_string()),
        }
        self.stale = true;
    }

    pub fn is_grouped_by(&self, field: &str) -> bool {
        self.group_by.iter().any(|f| f == field)
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    fn grouping_active(&self) -> bool {
        self.feature(TableConfiguration::grouping_enabled) && !self.group_by.is_empty()
    }

    fn expand_all_by_default(&self) -> bool {
        self.config
            .as_ref()
            .map(TableConfiguration::expand_all_by_default)
            .unwrap_or(true)
    }

    /// Flips one group (and every node sharing its path key) without
    /// rebuilding the tree. Returns the new expanded state.
    pub fn toggle_group(&mut self, key: &GroupPathKey) -> bool {
        if !self.feature(TableConfiguration::grouping_enabled) {
            log_debug!(category::GROUP, "grouping disabled, ignoring toggle_group");
            return self.is_group_expanded(key);
        }
        let default_expanded = self.expand_all_by_default();
        let expanded = self.expansion.toggle(key, default_expanded);
        let updated = self.tree.set_expanded_for_key(key, expanded);
        visibility::resolve_visibility(&mut self.tree);
        log_debug!(
            category::GROUP,
            "group {} -> expanded={} ({} nodes)",
            key,
            expanded,
            updated
        );
        expanded
    }

    pub fn expand_all(&mut self) {
        self.set_all_expanded(true);
    }

    pub fn collapse_all(&mut self) {
        self.set_all_expanded(false);
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        self.refresh();
        self.expansion.set_all(self.tree.keys(), expanded);
        self.tree.set_all_expanded(expanded);
        visibility::resolve_visibility(&mut self.tree);
        log_debug!(category::GROUP, "all groups expanded={}", expanded);
    }

    pub fn is_group_expanded(&self, key: &GroupPathKey) -> bool {
        self.expansion.resolve(key, self.expand_all_by_default())
    }

    pub fn expansion(&self) -> &ExpansionStore {
        &self.expansion
    }

    /// The current group tree, rebuilt first if stale.
    pub fn group_tree(&mut self) -> &GroupTree {
        self.refresh();
        &self.tree
    }

    // ========================================================================
    // FILTERING
    // ========================================================================

    fn filtering_enabled(&self) -> bool {
        self.feature(TableConfiguration::filtering_enabled)
    }

    fn filters_changed(&mut self) {
        self.filter.invalidate();
        self.stale = true;
    }

    /// Sets the global search text. Callers debounce keystrokes.
    pub fn set_filter(&mut self, search_text: &str) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.search_text = search_text.to_string();
        self.filters_changed();
    }

    pub fn clear_filter(&mut self) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.search_text.clear();
        self.filters_changed();
    }

    pub fn set_column_filter(&mut self, field: &str, operator: FilterOperator, value: &str) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.set_column_filter(field, operator, value);
        self.filters_changed();
    }

    pub fn set_column_filter_value(&mut self, field: &str, value: &str) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.set_column_value(field, value);
        self.filters_changed();
    }

    pub fn set_column_filter_operator(&mut self, field: &str, operator: FilterOperator) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.set_column_operator(field, operator);
        self.filters_changed();
    }

    pub fn clear_column_filter(&mut self, field: &str) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.clear_column(field);
        self.filters_changed();
    }

    pub fn clear_all_column_filters(&mut self) {
        if !self.filtering_enabled() {
            return;
        }
        self.filter_state.clear_all_columns();
        self.filters_changed();
    }

    pub fn has_column_filter(&self, field: &str) -> bool {
        self.filter_state.has_column_filter(field)
    }

    pub fn has_any_column_filter(&self) -> bool {
        self.filter_state.has_any_column_filter()
    }

    pub fn filter_state(&self) -> &FilterState {
        &self.filter_state
    }

    pub fn filter_operators(&self) -> Vec<FilterOperatorOption> {
        self.config
            .as_ref()
            .map(TableConfiguration::filter_operators)
            .unwrap_or_else(crate::definition::default_filter_operators)
    }

    /// Configured label of an operator (the Contains label when unlisted).
    pub fn operator_label(&self, operator: FilterOperator) -> String {
        let operators = self.filter_operators();
        operators
            .iter()
            .find(|o| o.value == operator)
            .or_else(|| operators.iter().find(|o| o.value == FilterOperator::Contains))
            .map(|o| o.label.clone())
            .unwrap_or_else(|| FilterOperator::Contains.default_label().to_string())
    }

    // ========================================================================
    // PAGINATION
    // ========================================================================

    /// Moves to a page. The index is not clamped to the page count.
    pub fn set_page(&mut self, page_index: usize, page_size: usize) {
        self.page.set_page(page_index, page_size);
        log_debug!(category::PAGE, "page {} (size {})", page_index, page_size);
    }

    pub fn set_show_all(&mut self, show_all: bool) {
        self.page.set_show_all(show_all);
    }

    pub fn toggle_show_all(&mut self) {
        self.page.toggle_show_all();
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn page_size_options(&self) -> Vec<usize> {
        self.config
            .as_ref()
            .and_then(|c| c.pagination.as_ref())
            .map(|p| p.size_options())
            .unwrap_or_else(|| crate::definition::DEFAULT_PAGE_SIZE_OPTIONS.to_vec())
    }

    /// Filtered member rows (group headers excluded).
    pub fn total_rows(&mut self) -> usize {
        self.refresh();
        self.filtered.len()
    }

    fn pagination_enabled(&self) -> bool {
        self.feature(TableConfiguration::pagination_enabled)
    }

    pub fn page_count(&mut self) -> usize {
        let total = self.total_rows();
        self.page.page_count(total, self.pagination_enabled())
    }

    pub fn displayed_rows_count(&mut self) -> usize {
        let total = self.total_rows();
        self.page.displayed_rows_count(total, self.pagination_enabled())
    }

    pub fn pagination_info(&mut self) -> String {
        let total = self.total_rows();
        self.page.pagination_info(total, self.pagination_enabled())
    }

    pub fn has_no_results(&mut self) -> bool {
        self.total_rows() == 0
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    fn selection_enabled(&self) -> bool {
        self.feature(TableConfiguration::selection_enabled)
    }

    fn selection_config(&self) -> Option<&crate::definition::SelectionConfig> {
        self.config.as_ref().and_then(|c| c.selection.as_ref())
    }

    fn multi_select(&self) -> bool {
        self.config
            .as_ref()
            .map(TableConfiguration::multi_select)
            .unwrap_or(true)
    }

    pub fn is_selectable(&self, key: RowKey) -> bool {
        self.store
            .get(key)
            .is_some_and(|r| selection::is_selectable(r, self.selection_config()))
    }

    pub fn is_selected(&self, key: RowKey) -> bool {
        self.selection.is_selected(key)
    }

    /// Flips one selectable row. Returns its new membership.
    pub fn toggle_selection(&mut self, key: RowKey) -> bool {
        if !self.selection_enabled() || !self.is_selectable(key) {
            return false;
        }
        self.status_message = None;
        let multi = self.multi_select();
        self.selection.toggle(key, multi)
    }

    /// Selects every selectable row of the filtered set (all pages).
    pub fn select_all(&mut self) {
        if !self.selection_enabled() || !self.multi_select() {
            return;
        }
        self.refresh();
        self.status_message = None;
        let keys = selection::selectable_keys(&self.store, &self.filtered, self.selection_config());
        for key in keys {
            self.selection.select(key);
        }
        log_debug!(category::SELECT, "selected {} rows", self.selection.len());
    }

    /// Deselects every selectable row of the filtered set. Selections
    /// hidden by the current filter are kept.
    pub fn clear_selection(&mut self) {
        if !self.selection_enabled() {
            return;
        }
        self.refresh();
        self.status_message = None;
        let keys = selection::selectable_keys(&self.store, &self.filtered, self.selection_config());
        self.selection.deselect_many(&keys);
        log_debug!(category::SELECT, "{} rows remain selected", self.selection.len());
    }

    /// Clears when every selectable row is selected, otherwise selects all.
    pub fn master_toggle(&mut self) {
        if !self.selection_enabled() {
            return;
        }
        let summary = self.selection_summary();
        if summary.selectable_count == 0 {
            return;
        }
        if summary.all_selected {
            self.clear_selection();
        } else {
            self.select_all();
        }
    }

    pub fn selection_summary(&mut self) -> SelectionSummary {
        self.refresh();
        selection::summarize(
            &self.selection,
            &self.store,
            &self.filtered,
            self.selection_config(),
        )
    }

    pub fn selected_keys(&self) -> &[RowKey] {
        self.selection.selected()
    }

    pub fn selected_records(&self) -> Vec<&Record> {
        self.selection
            .selected()
            .iter()
            .filter_map(|key| self.store.get(*key))
            .collect()
    }

    pub fn accept_selected(&mut self) -> String {
        self.row_action(RowAction::Accept)
    }

    pub fn reject_selected(&mut self) -> String {
        self.row_action(RowAction::Reject)
    }

    fn row_action(&mut self, action: RowAction) -> String {
        let config = self.config.as_ref().and_then(|c| c.selection.as_ref());
        let message = selection::apply_row_action(&mut self.selection, &self.store, config, action);
        self.status_message = Some(message.clone());
        message
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    // ========================================================================
    // COLUMNS
    // ========================================================================

    pub fn toggle_column_visibility(&mut self, field: &str) {
        if !self.feature(TableConfiguration::column_visibility_enabled) {
            return;
        }
        match self.column_visibility.get_mut(field) {
            Some(visible) => *visible = !*visible,
            None => log_warn!(category::CONFIG, "unknown column {}", field),
        }
    }

    pub fn is_column_visible(&self, field: &str) -> bool {
        self.column_visibility.get(field).copied().unwrap_or(false)
    }

    /// Columns currently shown, in configuration order.
    pub fn visible_columns(&self) -> Vec<&ColumnDefinition> {
        self.columns()
            .iter()
            .filter(|col| self.is_column_visible(&col.field))
            .collect()
    }

    /// Column ids for the view layer: "group" while grouping, "select" when
    /// selection is enabled, then the visible fields.
    pub fn displayed_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        if self.grouping_active() {
            columns.push(GROUP_COLUMN.to_string());
        }
        if self.selection_enabled() {
            columns.push(SELECT_COLUMN.to_string());
        }
        columns.extend(self.visible_columns().into_iter().map(|c| c.field.clone()));
        columns
    }

    // ========================================================================
    // ROW PRESENTATION
    // ========================================================================

    pub fn row_classes(&self, row: RowRef<'_>, index: usize) -> BTreeMap<String, bool> {
        let (selected, selectable) = match row {
            RowRef::Record { key, .. } => (self.is_selected(key), self.is_selectable(key)),
            RowRef::Group(_) => (false, false),
        };
        view::row_classes(
            row,
            index,
            selected,
            selectable,
            self.config.as_ref().and_then(|c| c.row_class_function.as_ref()),
        )
    }

    pub fn row_tooltip(&self, row: RowRef<'_>) -> &'static str {
        view::row_tooltip(row)
    }

    pub fn track_key(&self, row: RowRef<'_>, index: usize) -> String {
        let identity = self
            .config
            .as_ref()
            .map(|c| c.identity_field.as_str())
            .unwrap_or(crate::definition::DEFAULT_IDENTITY_FIELD);
        view::track_key(row, index, identity)
    }

    /// Display text of one cell, or None for unknown rows or columns.
    pub fn cell_value(&self, key: RowKey, field: &str, index: usize) -> Option<String> {
        let record = self.store.get(key)?;
        let column = self.config.as_ref()?.column(field)?;
        Some(view::cell_value(record, column, index))
    }

    pub fn cell_classes(&self, key: RowKey, field: &str, index: usize) -> BTreeMap<String, bool> {
        match (self.store.get(key), self.config.as_ref().and_then(|c| c.column(field))) {
            (Some(record), Some(column)) => view::cell_classes(record, column, index),
            _ => BTreeMap::new(),
        }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    pub fn available_export_formats(&self) -> Vec<ExportFormat> {
        self.config
            .as_ref()
            .and_then(|c| c.export.as_ref())
            .filter(|e| e.enabled)
            .map(|e| e.available_formats())
            .unwrap_or_default()
    }

    /// Selected rows (or every row in canonical order) projected through
    /// all configured columns.
    pub fn get_export_rows(&self) -> TableResult<Vec<ExportRow>> {
        let config = self.require_config()?;
        let keys = export::export_keys(&self.selection, &self.store);
        Ok(export::project(&self.store, &keys, &config.columns))
    }

    pub fn export_file_name(&self, format: ExportFormat) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        match self.config.as_ref().and_then(|c| c.export.as_ref()) {
            Some(export_config) => export::export_file_name(export_config, format, now),
            None => export::export_file_name(&Default::default(), format, now),
        }
    }

    /// Everything needed to write one export file. None when export is
    /// disabled, the format is not offered, or there are no rows.
    pub fn export_plan(&self, format: ExportFormat) -> TableResult<Option<ExportPlan>> {
        let config = self.require_config()?;
        if !self.available_export_formats().contains(&format) {
            log_debug!(category::EXPORT, "{:?} export not available", format);
            return Ok(None);
        }
        let rows = self.get_export_rows()?;
        let plan = ExportPlan::new(format, self.export_file_name(format), &config.columns, rows);
        if let Some(plan) = &plan {
            log_info!(
                category::EXPORT,
                "export plan {} with {} rows",
                plan.file_name,
                plan.rows.len()
            );
        }
        Ok(plan)
    }

    // ========================================================================
    // RECOMPUTE
    // ========================================================================

    /// Rebuilds filtered rows and the group tree if anything structural
    /// changed since the last pass.
    fn refresh(&mut self) {
        if !self.stale {
            return;
        }
        let Some(config) = self.config.as_ref() else {
            return;
        };
        log_enter!(category::VIEW, "refresh");

        self.filtered = self.filter.apply(
            &self.store,
            &self.filter_state,
            &config.columns,
            config.filtering.as_ref(),
        );

        let group_by: &[String] = if config.grouping_enabled() {
            &self.group_by
        } else {
            &[]
        };
        let mut tree = GroupTree::build(&self.store, &self.filtered, group_by);

        let default_expanded = config.expand_all_by_default();
        let expansion = &self.expansion;
        tree.assign_expansion(|key| expansion.resolve(key, default_expanded));
        visibility::resolve_visibility(&mut tree);

        self.tree = tree;
        self.stale = false;
        log_exit!(
            category::VIEW,
            "refresh",
            "{} rows, {} groups",
            self.filtered.len(),
            self.tree.groups().len()
        );
    }

    /// The current page of the display sequence plus counts and labels.
    pub fn get_view(&mut self) -> TableResult<TableView> {
        self.require_config()?;
        self.refresh();
        let config = self.require_config()?;

        let total_rows = self.filtered.len();
        let paginate = config.pagination_enabled();
        let rows = if total_rows == 0 {
            vec![ViewRow::NoResults]
        } else {
            let visible = visibility::visible_entries(&self.tree);
            self.page
                .slice(&visible, paginate)
                .iter()
                .filter_map(|entry| self.view_row(entry))
                .collect()
        };

        let selection = selection::summarize(
            &self.selection,
            &self.store,
            &self.filtered,
            config.selection.as_ref(),
        );

        log_debug!(
            category::VIEW,
            "view: {} rows on page, {} total",
            rows.len(),
            total_rows
        );

        Ok(TableView {
            rows,
            total_rows,
            page_info: self.page.pagination_info(total_rows, paginate),
            page: self.page,
            page_count: self.page.page_count(total_rows, paginate),
            displayed_rows_count: self.page.displayed_rows_count(total_rows, paginate),
            selection,
            status_message: self.status_message.clone(),
            displayed_columns: self.displayed_columns(),
            group_by: if config.grouping_enabled() {
                self.group_by.clone()
            } else {
                Vec::new()
            },
            sort: self.sort.clone(),
            search_text: self.filter_state.search_text.clone(),
        })
    }

    fn view_row(&self, entry: &FlatEntry) -> Option<ViewRow> {
        match entry {
            FlatEntry::Group(index) => self.tree.group(*index).cloned().map(ViewRow::Group),
            FlatEntry::Row { key, .. } => {
                let record = self.store.get(*key)?;
                Some(ViewRow::Record(RecordRow {
                    key: *key,
                    record: record.clone(),
                    selected: self.selection.is_selected(*key),
                    selectable: selection::is_selectable(record, self.selection_config()),
                }))
            }
        }
    }

    /// Filtered rows in canonical order.
    pub fn filtered_keys(&mut self) -> Arc<[RowKey]> {
        self.refresh();
        Arc::clone(&self.filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{
        FilteringConfig, GroupingConfig, PaginationConfig, SelectionConfig, SortDirection,
        SortingConfig,
    };

    fn engine() -> TableEngine {
        let mut config = TableConfiguration::new(vec![
            ColumnDefinition::new("brand", "Brand"),
            ColumnDefinition::new("color", "Color"),
        ]);
        config.grouping = Some(GroupingConfig {
            enabled: true,
            default_group_by_columns: vec!["brand".to_string()],
            expand_all_by_default: true,
        });
        config.filtering = Some(FilteringConfig {
            enabled: true,
            global_search_enabled: true,
            column_filters_enabled: true,
            filter_operators: None,
        });
        config.pagination = Some(PaginationConfig {
            enabled: true,
            default_page_size: Some(3),
            ..Default::default()
        });
        config.selection = Some(SelectionConfig {
            enabled: true,
            ..Default::default()
        });
        config.sorting = Some(SortingConfig {
            enabled: true,
            default_sort: None,
        });

        let mut engine = TableEngine::with_config(config).unwrap();
        engine
            .load(vec![
                Record::new().with("brand", "BMW").with("color", "Black"),
                Record::new().with("brand", "Audi").with("color", "Red"),
                Record::new().with("brand", "BMW").with("color", "Red"),
            ])
            .unwrap();
        engine
    }

    #[test]
    fn test_unconfigured_engine_reports_error() {
        let mut engine = TableEngine::new();
        assert!(matches!(engine.get_view(), Err(TableError::NotConfigured)));
        assert!(matches!(engine.load(Vec::new()), Err(TableError::NotConfigured)));
    }

    #[test]
    fn test_groups_count_as_page_entries() {
        let mut engine = engine();
        let view = engine.get_view().unwrap();
        // BMW header, two BMW rows
        assert_eq!(view.rows.len(), 3);
        assert!(view.rows[0].is_group());
        assert_eq!(view.total_rows, 3);
        assert_eq!(view.displayed_columns, vec!["group", "select", "brand", "color"]);
    }

    #[test]
    fn test_toggle_group_hides_members_without_rebuild() {
        let mut engine = engine();
        engine.get_view().unwrap();
        assert!(!engine.toggle_group(&GroupPathKey::from_values(["BMW"])));

        let view = engine.get_view().unwrap();
        let groups: Vec<&str> = view.group_rows().map(|g| g.value()).collect();
        assert_eq!(groups, vec!["BMW", "Audi"]);
        assert_eq!(view.record_rows().count(), 1);
    }

    #[test]
    fn test_no_results_marker() {
        let mut engine = engine();
        engine.set_filter("zzz");
        let view = engine.get_view().unwrap();
        assert_eq!(view.rows.len(), 1);
        assert!(view.rows[0].is_no_results());
        assert!(view.has_no_results());
        assert_eq!(view.page_info, "0-0 of 0");
    }

    #[test]
    fn test_sort_disabled_is_noop() {
        let mut engine = engine();
        engine.config.as_mut().unwrap().sorting = None;
        engine.set_sort(Some(SortSpec::new("brand", SortDirection::Asc)));
        assert!(engine.sort().is_none());
    }

    #[test]
    fn test_toggle_group_ignored_when_grouping_disabled() {
        let mut engine = engine();
        engine.config.as_mut().unwrap().grouping = None;
        assert!(engine.toggle_group(&GroupPathKey::from_values(["BMW"])));
        assert!(engine.expansion().is_empty());
    }

    #[test]
    fn test_master_toggle_round_trip() {
        let mut engine = engine();
        engine.master_toggle();
        assert!(engine.selection_summary().all_selected);
        engine.master_toggle();
        assert_eq!(engine.selection_summary().selected_count, 0);
    }

    #[test]
    fn test_status_message_cleared_by_selection_change() {
        let mut engine = engine();
        assert_eq!(engine.accept_selected(), "Please select at least one row.");
        assert!(engine.status_message().is_some());

        let key = engine.filtered_keys()[0];
        engine.toggle_selection(key);
        assert!(engine.status_message().is_none());
    }

    #[test]
    fn test_operator_label_uses_catalogue() {
        let engine = engine();
        assert_eq!(engine.operator_label(FilterOperator::NotEquals), "Does not equal");
    }
}
