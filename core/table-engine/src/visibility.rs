//! FILENAME: core/table-engine/src/visibility.rs
//! Visibility Resolver - decides which flattened entries render.
//!
//! A root group is always visible. A nested group is visible iff its parent
//! is visible and expanded. A member row is visible iff its leaf group is
//! visible and expanded, which means the whole ancestor chain is open.
//!
//! Resolution only touches the group arena, so toggling a group re-runs this
//! pass without rebuilding the tree.

use crate::grouping::{FlatEntry, GroupTree};

/// Recomputes every group's `visible` flag from the expanded flags.
pub fn resolve_visibility(tree: &mut GroupTree) {
    let groups = tree.groups_mut();
    // Parents precede their children in the arena
    for i in 0..groups.len() {
        let visible = match groups[i].parent {
            None => true,
            Some(p) => groups[p].visible && groups[p].expanded,
        };
        groups[i].visible = visible;
    }
}

/// The visibility predicate applied to every flattened entry.
pub fn is_entry_visible(tree: &GroupTree, entry: &FlatEntry) -> bool {
    match entry {
        FlatEntry::Group(index) => tree.group(*index).is_some_and(|g| g.visible),
        FlatEntry::Row { parent: None, .. } => true,
        FlatEntry::Row {
            parent: Some(index),
            ..
        } => tree.group(*index).is_some_and(|g| g.visible && g.expanded),
    }
}

/// The flattened sequence with hidden entries removed, order preserved.
pub fn visible_entries(tree: &GroupTree) -> Vec<FlatEntry> {
    tree.entries()
        .iter()
        .filter(|entry| is_entry_visible(tree, entry))
        .copied()
        .collect()
}
