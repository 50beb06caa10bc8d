//! FILENAME: core/table-engine/src/lib.rs
//! Tabular data engine.
//!
//! Given a record collection and a declarative configuration, this crate
//! derives a display-ready view: filtered, hierarchically grouped, sorted,
//! paginated, and annotated with selection state. It keeps user-toggled
//! group expansion across recomputes. Rendering and file encoding are left
//! to the caller.
//!
//! Layers:
//! - `definition`: Serializable configuration (what the table IS)
//! - `value`, `record`: Field values, records and the canonical record store
//! - `filter`, `sort`, `grouping`, `expansion`, `visibility`, `pagination`,
//!   `selection`, `export`: One module per pipeline stage
//! - `view`: Renderable output (WHAT we display)
//! - `engine`: Stateful orchestration (HOW we calculate)
//! - `source`: Asynchronous data ingestion

mod logging;

pub mod definition;
pub mod error;
pub mod value;
pub mod record;
pub mod filter;
pub mod sort;
pub mod grouping;
pub mod expansion;
pub mod visibility;
pub mod pagination;
pub mod selection;
pub mod export;
pub mod view;
pub mod source;
pub mod engine;

pub use logging::category;

pub use definition::*;
pub use error::{ConfigurationError, TableError, TableResult};
pub use value::FieldValue;
pub use record::{Record, RecordStore, RowKey};
pub use filter::{ColumnFilter, FilterPipeline, FilterState};
pub use grouping::{FlatEntry, GroupIndex, GroupNode, GroupPathKey, GroupTree};
pub use expansion::ExpansionStore;
pub use pagination::PageState;
pub use selection::{RowAction, SelectionLedger, SelectionSummary};
pub use export::{ExportPlan, ExportRow};
pub use view::{RecordRow, RowRef, TableView, ViewRow};
pub use source::{DataSource, Delivery, StaticSource};
pub use engine::TableEngine;
