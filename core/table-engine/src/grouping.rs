//! FILENAME: core/table-engine/src/grouping.rs
//! Group Tree Builder - partitions filtered rows into a nested hierarchy.
//!
//! The tree is rebuilt from scratch on every recompute:
//! 1. Structural pass: recursive first-seen partition by each group-by field,
//!    emitting a flat sequence where every group header is immediately
//!    followed by its own subtree.
//! 2. Expansion pass: every group's expanded flag is resolved by its path key.
//!
//! Groups live in an arena (`Vec<GroupNode>`) and point at their parent by
//! index. Groups are pushed before their children, so a parent index is
//! always lower than the index of any of its descendants.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::logging::{category, log_debug};
use crate::record::{RecordStore, RowKey};

/// Index of a group in `GroupTree::groups`.
pub type GroupIndex = usize;

const PATH_SEPARATOR: char = '|';
const PATH_ESCAPE: char = '\\';

// ============================================================================
// GROUP PATH KEY
// ============================================================================

/// Stable identity of a group across rebuilds: the accumulated group-by
/// values from the root down, joined by `|` (with `|` and `\` escaped).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupPathKey(String);

impl GroupPathKey {
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = String::new();
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                key.push(PATH_SEPARATOR);
            }
            push_escaped(&mut key, value.as_ref());
        }
        GroupPathKey(key)
    }

    /// Key of a child group one level below this one.
    pub fn child(&self, value: &str) -> Self {
        let mut key = String::with_capacity(self.0.len() + value.len() + 1);
        key.push_str(&self.0);
        key.push(PATH_SEPARATOR);
        push_escaped(&mut key, value);
        GroupPathKey(key)
    }

    fn root(value: &str) -> Self {
        let mut key = String::with_capacity(value.len());
        push_escaped(&mut key, value);
        GroupPathKey(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn push_escaped(key: &mut String, value: &str) {
    for c in value.chars() {
        if c == PATH_SEPARATOR || c == PATH_ESCAPE {
            key.push(PATH_ESCAPE);
        }
        key.push(c);
    }
}

impl fmt::Display for GroupPathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TREE TYPES
// ============================================================================

/// A synthetic header for one partition at one nesting level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode {
    /// 1-based nesting depth.
    pub level: usize,

    /// Group-by field partitioned at this level.
    pub field: String,

    /// Group-by values from the root down to this node.
    pub values: SmallVec<[String; 4]>,

    pub key: GroupPathKey,

    /// Member rows in this partition (all descendants, not just direct).
    pub member_count: usize,

    pub expanded: bool,

    pub visible: bool,

    /// Non-owning back reference into the arena.
    pub parent: Option<GroupIndex>,
}

impl GroupNode {
    /// The value this node partitions on (the last accumulated value).
    pub fn value(&self) -> &str {
        self.values.last().map(String::as_str).unwrap_or("")
    }
}

/// One slot of the flattened sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatEntry {
    Group(GroupIndex),
    /// A member row and the leaf group it belongs to (None when ungrouped).
    Row {
        key: RowKey,
        parent: Option<GroupIndex>,
    },
}

impl FlatEntry {
    pub fn row_key(&self) -> Option<RowKey> {
        match self {
            FlatEntry::Row { key, .. } => Some(*key),
            FlatEntry::Group(_) => None,
        }
    }
}

/// The group arena plus the flattened display sequence.
#[derive(Debug, Clone, Default)]
pub struct GroupTree {
    group_by: Vec<String>,
    groups: Vec<GroupNode>,
    entries: Vec<FlatEntry>,
    member_count: usize,
}

impl GroupTree {
    /// Structural pass. Every group starts expanded and visible until the
    /// expansion and visibility passes run.
    pub fn build(store: &RecordStore, rows: &[RowKey], group_by: &[String]) -> Self {
        let mut tree = GroupTree {
            group_by: group_by.to_vec(),
            groups: Vec::new(),
            entries: Vec::with_capacity(rows.len()),
            member_count: rows.len(),
        };

        if group_by.is_empty() {
            tree.entries
                .extend(rows.iter().map(|&key| FlatEntry::Row { key, parent: None }));
            return tree;
        }

        tree.partition_level(store, rows, 0, None);

        log_debug!(
            category::GROUP,
            "built {} groups over {} rows by {:?}",
            tree.groups.len(),
            rows.len(),
            group_by
        );
        tree
    }

    fn partition_level(
        &mut self,
        store: &RecordStore,
        rows: &[RowKey],
        level: usize,
        parent: Option<GroupIndex>,
    ) {
        let field = &self.group_by[level];

        // First-seen order of distinct values
        let mut slots: FxHashMap<String, usize> = FxHashMap::default();
        let mut partitions: Vec<(String, Vec<RowKey>)> = Vec::new();
        for &key in rows {
            let value = store.get(key).map(|r| r.text(field)).unwrap_or_default();
            match slots.get(&value) {
                Some(&slot) => partitions[slot].1.push(key),
                None => {
                    slots.insert(value.clone(), partitions.len());
                    partitions.push((value, vec![key]));
                }
            }
        }

        let is_terminal = level + 1 == self.group_by.len();
        let field = field.clone();

        for (value, members) in partitions {
            let (values, key) = match parent {
                Some(p) => {
                    let parent_node = &self.groups[p];
                    let mut values = parent_node.values.clone();
                    values.push(value.clone());
                    (values, parent_node.key.child(&value))
                }
                None => {
                    let key = GroupPathKey::root(&value);
                    let mut values = SmallVec::new();
                    values.push(value);
                    (values, key)
                }
            };

            let index = self.groups.len();
            self.groups.push(GroupNode {
                level: level + 1,
                field: field.clone(),
                values,
                key,
                member_count: members.len(),
                expanded: true,
                visible: true,
                parent,
            });
            self.entries.push(FlatEntry::Group(index));

            if is_terminal {
                self.entries.extend(members.into_iter().map(|key| FlatEntry::Row {
                    key,
                    parent: Some(index),
                }));
            } else {
                self.partition_level(store, &members, level + 1, Some(index));
            }
        }
    }

    /// Expansion pass: resolves each group's expanded flag by its path key.
    pub fn assign_expansion<F>(&mut self, mut resolve: F)
    where
        F: FnMut(&GroupPathKey) -> bool,
    {
        for group in &mut self.groups {
            group.expanded = resolve(&group.key);
        }
    }

    /// Sets the expanded flag on every node sharing `key`.
    /// Returns the number of nodes updated.
    pub fn set_expanded_for_key(&mut self, key: &GroupPathKey, expanded: bool) -> usize {
        let mut updated = 0;
        for group in self.groups.iter_mut().filter(|g| &g.key == key) {
            group.expanded = expanded;
            updated += 1;
        }
        updated
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        for group in &mut self.groups {
            group.expanded = expanded;
        }
    }

    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    pub fn group_by(&self) -> &[String] {
        &self.group_by
    }

    pub fn group(&self, index: GroupIndex) -> Option<&GroupNode> {
        self.groups.get(index)
    }

    pub fn groups(&self) -> &[GroupNode] {
        &self.groups
    }

    pub(crate) fn groups_mut(&mut self) -> &mut [GroupNode] {
        &mut self.groups
    }

    pub fn find(&self, key: &GroupPathKey) -> Option<GroupIndex> {
        self.groups.iter().position(|g| &g.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupPathKey> {
        self.groups.iter().map(|g| &g.key)
    }

    /// The full flattened sequence, before visibility.
    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    /// Member rows in the tree (group headers excluded).
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    /// Walks from a group up to the root, nearest first.
    pub fn ancestors(&self, index: GroupIndex) -> impl Iterator<Item = &GroupNode> {
        let mut next = self.groups.get(index).and_then(|g| g.parent);
        std::iter::from_fn(move || {
            let current = next?;
            let node = self.groups.get(current)?;
            next = node.parent;
            Some(node)
        })
    }
}
