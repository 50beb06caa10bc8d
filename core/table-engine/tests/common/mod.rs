//! FILENAME: tests/common/mod.rs
//! Test harness and fixtures for table engine integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use table_engine::{
    GroupPathKey, RowKey, TableConfiguration, TableEngine, TableView, ViewRow,
};

/// The car table configuration used by the demo application.
pub const CAR_CONFIG_JSON: &str = r#"{
    "columns": [
        { "field": "id", "label": "ID", "width": 80 },
        { "field": "vin", "label": "VIN", "width": "200px" },
        { "field": "brand", "label": "Brand" },
        { "field": "year", "label": "Year", "align": "right" },
        { "field": "color", "label": "Color" }
    ],
    "pagination": { "enabled": true, "defaultPageSize": 10, "pageSizeOptions": [5, 10, 25] },
    "grouping": { "enabled": true, "defaultGroupByColumns": ["brand"], "expandAllByDefault": true },
    "sorting": { "enabled": true, "defaultSort": { "active": "id", "direction": "asc" } },
    "filtering": { "enabled": true, "globalSearchEnabled": true, "columnFiltersEnabled": true },
    "selection": { "enabled": true, "multiSelect": true },
    "export": { "enabled": true, "fileName": "cars-export.csv" },
    "columnVisibility": { "enabled": true }
}"#;

/// The 15 cars of the demo data service, wrapped in `{ "data": [...] }`.
/// No record carries an id; load backfills 1..=15.
pub fn car_payload() -> Value {
    json!({
        "data": [
            { "vin": "WVWAA71K08W201030", "brand": "Volkswagen", "year": 2008, "color": "Blue" },
            { "vin": "1HGBH41JXMN109186", "brand": "Honda", "year": 2019, "color": "Red" },
            { "vin": "1HGBH41JXMN109187", "brand": "Honda", "year": 2020, "color": "Black" },
            { "vin": "1HGBH41JXMN109188", "brand": "Honda", "year": 2021, "color": "White" },
            { "vin": "5YJSA1E14HF000000", "brand": "Tesla", "year": 2017, "color": "Red" },
            { "vin": "5YJSA1E14HF000001", "brand": "Tesla", "year": 2018, "color": "Black" },
            { "vin": "5YJSA1E14HF000002", "brand": "Tesla", "year": 2019, "color": "White" },
            { "vin": "1FTFW1ET5DFC12345", "brand": "Ford", "year": 2013, "color": "Blue" },
            { "vin": "1FTFW1ET5DFC12346", "brand": "Ford", "year": 2014, "color": "Red" },
            { "vin": "1FTFW1ET5DFC12347", "brand": "Ford", "year": 2015, "color": "Silver" },
            { "vin": "JN1AZ4EH8FM123456", "brand": "Nissan", "year": 2015, "color": "Black" },
            { "vin": "JN1AZ4EH8FM123457", "brand": "Nissan", "year": 2016, "color": "White" },
            { "vin": "WBA3A5C58EF123456", "brand": "BMW", "year": 2014, "color": "Blue" },
            { "vin": "WBA3A5C58EF123457", "brand": "BMW", "year": 2015, "color": "Black", "disable": true },
            { "vin": "WBA3A5C58EF123458", "brand": "BMW", "year": 2016, "color": "Silver", "isDupicate": true }
        ]
    })
}

pub fn car_config() -> TableConfiguration {
    TableConfiguration::from_json_str(CAR_CONFIG_JSON).unwrap()
}

/// Test harness wrapping a configured engine.
pub struct TestHarness {
    pub engine: TableEngine,
}

impl TestHarness {
    /// A configured engine with no data.
    pub fn new() -> Self {
        TestHarness {
            engine: TableEngine::with_config(car_config()).unwrap(),
        }
    }

    /// A configured engine with the 15 cars loaded (grouped by brand).
    pub fn with_cars() -> Self {
        let mut harness = Self::new();
        harness.engine.load_json(&car_payload()).unwrap();
        harness
    }

    /// The 15 cars without grouping.
    pub fn with_cars_ungrouped() -> Self {
        let mut harness = Self::with_cars();
        harness.engine.set_group_by(Vec::new());
        harness
    }

    pub fn view(&mut self) -> TableView {
        self.engine.get_view().unwrap()
    }

    /// Row key of the car with the given VIN.
    pub fn key_for_vin(&self, vin: &str) -> RowKey {
        self.engine
            .store()
            .iter_original()
            .find(|(_, record)| record.text("vin") == vin)
            .map(|(key, _)| key)
            .unwrap()
    }

    /// Group header values on the current page, in display order.
    pub fn group_values(&mut self) -> Vec<String> {
        self.view()
            .group_rows()
            .map(|g| g.value().to_string())
            .collect()
    }

    /// One text field of every member row on the current page.
    pub fn row_texts(&mut self, field: &str) -> Vec<String> {
        self.view()
            .record_rows()
            .map(|row| row.record.text(field))
            .collect()
    }

    /// A compact description of the page: "G:Honda", "R:2020", ...
    pub fn page_shape(&mut self, field: &str) -> Vec<String> {
        self.view()
            .rows
            .iter()
            .map(|row| match row {
                ViewRow::Group(g) => format!("G:{}", g.key),
                ViewRow::Record(r) => format!("R:{}", r.record.text(field)),
                ViewRow::NoResults => "NoResults".to_string(),
            })
            .collect()
    }
}

pub fn path(values: &[&str]) -> GroupPathKey {
    GroupPathKey::from_values(values.iter())
}
