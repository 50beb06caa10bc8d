//! FILENAME: core/table-engine/src/selection.rs
//! Selection Ledger - which member rows are selected, by row identity.
//!
//! Selection is keyed by `RowKey`, never by the record's id field. Keys are
//! tied to a load generation, so a reload with structurally identical
//! records does not carry the old selection over.
//!
//! Selectability: a member row is selectable iff the configured predicate
//! accepts it, or (without a predicate) it carries neither a duplicate flag
//! (`isDupicate` / `isDuplicate`) nor a disabled flag (`disable` / `disabled`).

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::definition::SelectionConfig;
use crate::logging::{category, log_debug};
use crate::record::{Record, RecordStore, RowKey};

const DUPLICATE_FLAGS: [&str; 2] = ["isDupicate", "isDuplicate"];
const DISABLED_FLAGS: [&str; 2] = ["disable", "disabled"];

// ============================================================================
// SELECTABILITY
// ============================================================================

pub fn is_duplicate(record: &Record) -> bool {
    DUPLICATE_FLAGS.iter().any(|flag| record.get(flag).is_truthy())
}

pub fn is_disabled(record: &Record) -> bool {
    DISABLED_FLAGS.iter().any(|flag| record.get(flag).is_truthy())
}

pub fn is_selectable(record: &Record, config: Option<&SelectionConfig>) -> bool {
    if let Some(predicate) = config.and_then(|c| c.selectable_row_predicate.as_ref()) {
        return (predicate.get())(record);
    }
    !is_duplicate(record) && !is_disabled(record)
}

// ============================================================================
// LEDGER
// ============================================================================

/// The selected row keys, kept in selection order.
#[derive(Debug, Clone, Default)]
pub struct SelectionLedger {
    selected: FxHashSet<RowKey>,
    order: Vec<RowKey>,
}

impl SelectionLedger {
    pub fn new() -> Self {
        SelectionLedger::default()
    }

    pub fn is_selected(&self, key: RowKey) -> bool {
        self.selected.contains(&key)
    }

    pub fn select(&mut self, key: RowKey) {
        if self.selected.insert(key) {
            self.order.push(key);
        }
    }

    pub fn deselect(&mut self, key: RowKey) {
        if self.selected.remove(&key) {
            self.order.retain(|k| *k != key);
        }
    }

    /// Removes every key in `keys`, keeping the order of the rest.
    pub fn deselect_many(&mut self, keys: &[RowKey]) {
        let before = self.selected.len();
        for key in keys {
            self.selected.remove(key);
        }
        if self.selected.len() != before {
            let selected = &self.selected;
            self.order.retain(|k| selected.contains(k));
        }
    }

    /// Flips membership. In single-select mode selecting a row replaces the
    /// current selection. Returns the new membership.
    pub fn toggle(&mut self, key: RowKey, multi_select: bool) -> bool {
        if self.is_selected(key) {
            self.deselect(key);
            return false;
        }
        if !multi_select {
            self.clear();
        }
        self.select(key);
        true
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.order.clear();
    }

    /// Selected keys in the order they were selected.
    pub fn selected(&self) -> &[RowKey] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops keys that no longer resolve in `store` (after a reload).
    /// Returns the number of keys dropped.
    pub fn prune(&mut self, store: &RecordStore) -> usize {
        let before = self.order.len();
        self.order.retain(|key| store.contains(*key));
        self.selected.retain(|key| store.contains(*key));
        before - self.order.len()
    }
}

// ============================================================================
// TRI-STATE
// ============================================================================

/// Derived counts over the select-all scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionSummary {
    /// Selectable rows in scope.
    pub selectable_count: usize,
    /// Selected rows among the selectable rows in scope.
    pub selected_count: usize,
    /// Every selected key, in or out of scope.
    pub total_selected: usize,
    pub all_selected: bool,
    pub indeterminate: bool,
}

/// Selectable keys among `scope`, in scope order.
pub fn selectable_keys(
    store: &RecordStore,
    scope: &[RowKey],
    config: Option<&SelectionConfig>,
) -> Vec<RowKey> {
    scope
        .iter()
        .copied()
        .filter(|key| store.get(*key).is_some_and(|r| is_selectable(r, config)))
        .collect()
}

pub fn summarize(
    ledger: &SelectionLedger,
    store: &RecordStore,
    scope: &[RowKey],
    config: Option<&SelectionConfig>,
) -> SelectionSummary {
    let selectable = selectable_keys(store, scope, config);
    let selectable_count = selectable.len();
    let selected_count = selectable.iter().filter(|k| ledger.is_selected(**k)).count();

    SelectionSummary {
        selectable_count,
        selected_count,
        total_selected: ledger.len(),
        all_selected: selectable_count > 0 && selected_count == selectable_count,
        indeterminate: selected_count > 0 && selected_count < selectable_count,
    }
}

// ============================================================================
// ROW-LEVEL ACTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowAction {
    Accept,
    Reject,
}

impl RowAction {
    fn verb(&self) -> &'static str {
        match self {
            RowAction::Accept => "Accepted",
            RowAction::Reject => "Rejected",
        }
    }
}

/// Applies a row-level action to the selected selectable rows and returns
/// the status message. The selection is cleared when anything was acted on.
pub fn apply_row_action(
    ledger: &mut SelectionLedger,
    store: &RecordStore,
    config: Option<&SelectionConfig>,
    action: RowAction,
) -> String {
    let count = ledger
        .selected()
        .iter()
        .filter(|key| store.get(**key).is_some_and(|r| is_selectable(r, config)))
        .count();

    if count == 0 {
        return "Please select at least one row.".to_string();
    }

    log_debug!(category::SELECT, "{:?} applied to {} rows", action, count);
    ledger.clear();
    format!(
        "{} {} {}.",
        action.verb(),
        count,
        if count == 1 { "row" } else { "rows" }
    )
}
