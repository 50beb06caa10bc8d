//! FILENAME: core/table-engine/src/logging.rs
//! PURPOSE: Category-tagged logging macros for the table engine.
//! CONTEXT: Every line is routed through the `log` facade with the category
//! as the log target (e.g. "FILTER", "GROUP"), so the host application picks
//! the backend and can filter per engine stage. The engine never installs a
//! logger itself.

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $cat, $($arg)*)
    };
}

macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $cat, $($arg)*)
    };
}

macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        ::log::warn!(target: $cat, $($arg)*)
    };
}

macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        ::log::error!(target: $cat, $($arg)*)
    };
}

// ENTER/EXIT for tracing the full recompute pass

macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        ::log::trace!(target: $cat, "[ENTER] {}", $func)
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        ::log::trace!(target: $cat, "[ENTER] {} {}", $func, format!($($arg)*))
    };
}

macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        ::log::trace!(target: $cat, "[EXIT] {}", $func)
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        ::log::trace!(target: $cat, "[EXIT] {} {}", $func, format!($($arg)*))
    };
}

// Re-export the macros so they can be imported via `use crate::logging::log_info;`
pub(crate) use log_debug;
pub(crate) use log_enter;
pub(crate) use log_error;
pub(crate) use log_exit;
pub(crate) use log_info;
pub(crate) use log_warn;

/// Log targets used by the engine, one per pipeline stage.
pub mod category {
    pub const CONFIG: &str = "CONFIG";
    pub const DATA: &str = "DATA";
    pub const FILTER: &str = "FILTER";
    pub const SORT: &str = "SORT";
    pub const GROUP: &str = "GROUP";
    pub const SELECT: &str = "SELECT";
    pub const EXPORT: &str = "EXPORT";
    pub const PAGE: &str = "PAGE";
    pub const VIEW: &str = "VIEW";
}
