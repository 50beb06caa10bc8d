//! FILENAME: core/table-engine/src/expansion.rs
//! Expansion State Store - remembers expanded/collapsed groups by path key.
//!
//! Entries outlive any single group tree. Keys that no longer match a group
//! after a filter or group-by change are simply unused.

use rustc_hash::FxHashMap;

use crate::grouping::GroupPathKey;

/// Per-table expansion memory.
#[derive(Debug, Clone, Default)]
pub struct ExpansionStore {
    states: FxHashMap<GroupPathKey, bool>,

    /// Set by expand-all / collapse-all; overrides the configured default
    /// for groups that have no stored state yet.
    default_bias: Option<bool>,
}

impl ExpansionStore {
    pub fn new() -> Self {
        ExpansionStore::default()
    }

    pub fn get(&self, key: &GroupPathKey) -> Option<bool> {
        self.states.get(key).copied()
    }

    /// Stored state, then the bulk bias, then `expand_all_by_default`.
    pub fn resolve(&self, key: &GroupPathKey, expand_all_by_default: bool) -> bool {
        self.get(key)
            .or(self.default_bias)
            .unwrap_or(expand_all_by_default)
    }

    pub fn set(&mut self, key: GroupPathKey, expanded: bool) {
        self.states.insert(key, expanded);
    }

    /// Flips one key and returns its new state.
    pub fn toggle(&mut self, key: &GroupPathKey, expand_all_by_default: bool) -> bool {
        let expanded = !self.resolve(key, expand_all_by_default);
        self.states.insert(key.clone(), expanded);
        expanded
    }

    /// Sets every known key plus `keys` and biases future defaults.
    pub fn set_all<'a, I>(&mut self, keys: I, expanded: bool)
    where
        I: IntoIterator<Item = &'a GroupPathKey>,
    {
        for state in self.states.values_mut() {
            *state = expanded;
        }
        for key in keys {
            self.states.insert(key.clone(), expanded);
        }
        self.default_bias = Some(expanded);
    }

    pub fn default_bias(&self) -> Option<bool> {
        self.default_bias
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(values: &[&str]) -> GroupPathKey {
        GroupPathKey::from_values(values.iter())
    }

    #[test]
    fn test_resolution_order() {
        let mut store = ExpansionStore::new();
        assert!(store.resolve(&key(&["BMW"]), true));
        assert!(!store.resolve(&key(&["BMW"]), false));

        store.set_all([key(&["Audi"])].iter(), false);
        assert!(!store.resolve(&key(&["BMW"]), true));

        store.set(key(&["BMW"]), true);
        assert!(store.resolve(&key(&["BMW"]), false));
    }

    #[test]
    fn test_toggle_flips_resolved_state() {
        let mut store = ExpansionStore::new();
        assert!(!store.toggle(&key(&["BMW"]), true));
        assert!(store.toggle(&key(&["BMW"]), true));
        assert_eq!(store.get(&key(&["BMW"])), Some(true));
    }

    #[test]
    fn test_set_all_overwrites_orphaned_keys() {
        let mut store = ExpansionStore::new();
        store.set(key(&["Gone"]), false);
        store.set_all(std::iter::empty(), true);
        assert_eq!(store.get(&key(&["Gone"])), Some(true));
        assert_eq!(store.default_bias(), Some(true));
    }
}
