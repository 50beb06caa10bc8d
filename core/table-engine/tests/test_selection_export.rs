//! FILENAME: core/table-engine/tests/test_selection_export.rs
//! PURPOSE: Tests for the selection ledger, row actions, columns and export.

mod common;

use common::{car_payload, TestHarness, CAR_CONFIG_JSON};
use table_engine::{ExportFormat, SortDirection, SortSpec, TableConfiguration, TableEngine};

fn ids(rows: &[table_engine::ExportRow]) -> Vec<&str> {
    rows.iter().filter_map(|row| row.get("ID")).collect()
}

// ============================================================================
// SELECTION
// ============================================================================

#[test]
fn test_select_all_skips_disabled_and_duplicates() {
    let mut harness = TestHarness::with_cars();
    harness.engine.select_all();

    let summary = harness.engine.selection_summary();
    assert_eq!(summary.selectable_count, 13);
    assert_eq!(summary.selected_count, 13);
    assert!(summary.all_selected);
    assert!(!summary.indeterminate);

    let disabled = harness.key_for_vin("WBA3A5C58EF123457");
    let duplicate = harness.key_for_vin("WBA3A5C58EF123458");
    assert!(!harness.engine.is_selected(disabled));
    assert!(!harness.engine.is_selected(duplicate));
}

#[test]
fn test_select_all_reaches_collapsed_and_other_pages() {
    let mut harness = TestHarness::with_cars();
    harness.engine.collapse_all();
    harness.engine.select_all();
    assert_eq!(harness.engine.selected_keys().len(), 13);

    harness.engine.master_toggle();
    assert_eq!(harness.engine.selected_keys().len(), 0);
}

#[test]
fn test_select_all_is_scoped_to_filtered_rows() {
    let mut harness = TestHarness::with_cars();
    harness.engine.set_filter("tesla");
    harness.engine.select_all();
    assert_eq!(harness.engine.selected_keys().len(), 3);

    // Widening the filter leaves the selection partial
    harness.engine.clear_filter();
    let summary = harness.view().selection;
    assert_eq!(summary.selected_count, 3);
    assert!(summary.indeterminate);
}

#[test]
fn test_selection_persists_across_pages_and_filters() {
    let mut harness = TestHarness::with_cars();
    let honda = harness.key_for_vin("1HGBH41JXMN109186");
    assert!(harness.engine.toggle_selection(honda));

    harness.engine.set_page(1, 10);
    harness.engine.set_filter("ford");
    assert!(harness.engine.is_selected(honda));
    assert_eq!(harness.view().selection.total_selected, 1);

    assert!(!harness.engine.toggle_selection(honda));
    assert!(!harness.engine.is_selected(honda));
}

#[test]
fn test_clear_only_touches_filtered_rows() {
    let mut harness = TestHarness::with_cars();
    let honda = harness.key_for_vin("1HGBH41JXMN109186");
    harness.engine.toggle_selection(honda);

    harness.engine.set_filter("ford");
    harness.engine.select_all();
    assert_eq!(harness.engine.selected_keys().len(), 4);

    // All three Fords are selected, so the master toggle clears them
    harness.engine.master_toggle();
    assert_eq!(harness.engine.selected_keys(), &[honda]);

    harness.engine.clear_filter();
    harness.engine.clear_selection();
    assert!(harness.engine.selected_keys().is_empty());
}

#[test]
fn test_reload_drops_previous_selection() {
    let mut harness = TestHarness::with_cars();
    let honda = harness.key_for_vin("1HGBH41JXMN109186");
    harness.engine.toggle_selection(honda);

    harness.engine.load_json(&car_payload()).unwrap();
    assert!(harness.engine.selected_keys().is_empty());
    assert_ne!(harness.key_for_vin("1HGBH41JXMN109186"), honda);
}

#[test]
fn test_single_select_replaces_selection() {
    let json = CAR_CONFIG_JSON.replace(r#""multiSelect": true"#, r#""multiSelect": false"#);
    let config = TableConfiguration::from_json_str(&json).unwrap();
    let mut engine = TableEngine::with_config(config).unwrap();
    engine.load_json(&car_payload()).unwrap();

    let keys = engine.filtered_keys();
    engine.toggle_selection(keys[0]);
    engine.toggle_selection(keys[1]);
    assert_eq!(engine.selected_keys(), &[keys[1]]);

    engine.select_all();
    assert_eq!(engine.selected_keys().len(), 1);
}

// ============================================================================
// ROW ACTIONS
// ============================================================================

#[test]
fn test_accept_and_reject_messages() {
    let mut harness = TestHarness::with_cars();
    assert_eq!(
        harness.engine.reject_selected(),
        "Please select at least one row."
    );

    let keys = harness.engine.filtered_keys();
    harness.engine.toggle_selection(keys[0]);
    harness.engine.toggle_selection(keys[1]);
    assert_eq!(harness.engine.accept_selected(), "Accepted 2 rows.");
    assert!(harness.engine.selected_keys().is_empty());

    let view = harness.view();
    assert_eq!(view.status_message.as_deref(), Some("Accepted 2 rows."));
    assert_eq!(view.selection.total_selected, 0);
}

// ============================================================================
// COLUMNS AND CELLS
// ============================================================================

#[test]
fn test_column_visibility_toggle() {
    let mut harness = TestHarness::with_cars();
    assert_eq!(
        harness.view().displayed_columns,
        vec!["group", "select", "id", "vin", "brand", "year", "color"]
    );

    harness.engine.toggle_column_visibility("vin");
    assert!(!harness.engine.is_column_visible("vin"));
    assert_eq!(
        harness.view().displayed_columns,
        vec!["group", "select", "id", "brand", "year", "color"]
    );

    // Unknown columns are ignored
    harness.engine.toggle_column_visibility("mileage");
    assert_eq!(harness.engine.visible_columns().len(), 4);
}

#[test]
fn test_cell_value_lookup() {
    let harness = TestHarness::with_cars();
    let key = harness.key_for_vin("1HGBH41JXMN109187");
    assert_eq!(harness.engine.cell_value(key, "brand", 0).as_deref(), Some("Honda"));
    assert_eq!(harness.engine.cell_value(key, "year", 0).as_deref(), Some("2020"));
    assert_eq!(harness.engine.cell_value(key, "mileage", 0), None);
}

// ============================================================================
// EXPORT
// ============================================================================

#[test]
fn test_export_without_selection_uses_every_row() {
    let harness = TestHarness::with_cars();
    let rows = harness.engine.get_export_rows().unwrap();
    assert_eq!(rows.len(), 15);

    let headers: Vec<&str> = rows[0].headers().collect();
    assert_eq!(headers, vec!["ID", "VIN", "Brand", "Year", "Color"]);
    let values: Vec<&str> = rows[0].values().collect();
    assert_eq!(values, vec!["1", "WVWAA71K08W201030", "Volkswagen", "2008", "Blue"]);
}

#[test]
fn test_export_ignores_filters_and_hidden_columns() {
    let mut harness = TestHarness::with_cars();
    harness.engine.set_filter("honda");
    harness.engine.toggle_column_visibility("vin");

    let rows = harness.engine.get_export_rows().unwrap();
    assert_eq!(rows.len(), 15);
    assert_eq!(rows[0].len(), 5);
}

#[test]
fn test_export_follows_sort_and_selection_order() {
    let mut harness = TestHarness::with_cars();
    harness
        .engine
        .set_sort(Some(SortSpec::new("year", SortDirection::Desc)));
    let rows = harness.engine.get_export_rows().unwrap();
    assert_eq!(ids(&rows)[..3], ["4", "3", "2"]);

    let tesla = harness.key_for_vin("5YJSA1E14HF000000");
    let honda = harness.key_for_vin("1HGBH41JXMN109186");
    harness.engine.toggle_selection(tesla);
    harness.engine.toggle_selection(honda);

    let rows = harness.engine.get_export_rows().unwrap();
    assert_eq!(ids(&rows), vec!["5", "2"]);
}

#[test]
fn test_export_plan_names_and_formats() {
    let harness = TestHarness::with_cars();
    assert_eq!(
        harness.engine.available_export_formats(),
        vec![ExportFormat::Csv, ExportFormat::Xlsx]
    );

    let plan = harness.engine.export_plan(ExportFormat::Xlsx).unwrap().unwrap();
    assert_eq!(plan.file_name, "cars-export.xlsx");
    assert_eq!(plan.headers, vec!["ID", "VIN", "Brand", "Year", "Color"]);
    assert_eq!(plan.rows.len(), 15);

    assert!(harness.engine.export_plan(ExportFormat::Xls).unwrap().is_none());
}

#[test]
fn test_export_plan_empty_table() {
    let harness = TestHarness::new();
    assert!(harness.engine.export_plan(ExportFormat::Csv).unwrap().is_none());
}
