//! FILENAME: core/table-engine/src/sort.rs
//! Sort Stage - reorders the canonical record set by one field.
//!
//! Sorting always starts from the original load order and produces a new
//! canonical order; record contents are never touched. Clearing the sort
//! reinstates the load order verbatim.
//!
//! Comparator:
//! - nulls sort last in both directions
//! - two numbers compare numerically
//! - everything else compares by collation: accents and case are folded
//!   away and digit runs compare by numeric value ("item2" < "item10")

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::definition::{SortDirection, SortSpec};
use crate::logging::{category, log_debug};
use crate::record::{RecordStore, RowKey};
use crate::value::FieldValue;

// ============================================================================
// COLLATION
// ============================================================================

/// Folds a string to its base letters: NFD, combining marks dropped,
/// lowercased.
pub fn collation_fold(s: &str) -> Vec<char> {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Compares two folded strings, treating ASCII digit runs as numbers.
fn compare_folded(a: &[char], b: &[char]) -> Ordering {
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let start_a = i;
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            let start_b = j;
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }

            let run_a = strip_leading_zeros(&a[start_a..i]);
            let run_b = strip_leading_zeros(&b[start_b..j]);
            let ord = run_a.len().cmp(&run_b.len()).then_with(|| run_a.cmp(run_b));
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            let ord = a[i].cmp(&b[j]);
            if ord != Ordering::Equal {
                return ord;
            }
            i += 1;
            j += 1;
        }
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn strip_leading_zeros(run: &[char]) -> &[char] {
    let first_non_zero = run.iter().position(|c| *c != '0').unwrap_or(run.len());
    &run[first_non_zero..]
}

/// Case- and accent-insensitive, numeric-aware string comparison.
pub fn compare_natural(a: &str, b: &str) -> Ordering {
    compare_folded(&collation_fold(a), &collation_fold(b))
}

// ============================================================================
// COMPARATOR
// ============================================================================

/// Pre-computed comparison key for one record.
#[derive(Debug, Clone)]
enum SortKey {
    Null,
    Number { value: f64, folded: Vec<char> },
    Text(Vec<char>),
}

impl SortKey {
    fn from_value(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => SortKey::Null,
            FieldValue::Number(n) => SortKey::Number {
                value: *n,
                folded: collation_fold(&value.display_text()),
            },
            other => SortKey::Text(collation_fold(&other.display_text())),
        }
    }

    fn folded(&self) -> &[char] {
        match self {
            SortKey::Null => &[],
            SortKey::Number { folded, .. } => folded,
            SortKey::Text(folded) => folded,
        }
    }
}

fn compare_keys(a: &SortKey, b: &SortKey, direction: SortDirection) -> Ordering {
    let ord = match (a, b) {
        (SortKey::Null, SortKey::Null) => return Ordering::Equal,
        (SortKey::Null, _) => return Ordering::Greater,
        (_, SortKey::Null) => return Ordering::Less,
        (SortKey::Number { value: na, .. }, SortKey::Number { value: nb, .. }) => {
            na.partial_cmp(nb).unwrap_or(Ordering::Equal)
        }
        _ => compare_folded(a.folded(), b.folded()),
    };

    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Compares two field values under the sort comparator.
pub fn compare_values(a: &FieldValue, b: &FieldValue, direction: SortDirection) -> Ordering {
    compare_keys(&SortKey::from_value(a), &SortKey::from_value(b), direction)
}

// ============================================================================
// STAGE
// ============================================================================

/// Returns the load order stably sorted by `spec`.
pub fn sorted_order(store: &RecordStore, spec: &SortSpec) -> Vec<RowKey> {
    let mut keyed: Vec<(RowKey, SortKey)> = store
        .iter_original()
        .map(|(key, record)| (key, SortKey::from_value(record.get(&spec.active))))
        .collect();

    keyed.sort_by(|(_, a), (_, b)| compare_keys(a, b, spec.direction));
    keyed.into_iter().map(|(key, _)| key).collect()
}

/// Rewrites the store's canonical order for `sort` (or restores load order).
pub fn apply_sort(store: &mut RecordStore, sort: Option<&SortSpec>) {
    match sort {
        Some(spec) => {
            let order = sorted_order(store, spec);
            log_debug!(
                category::SORT,
                "sorted {} rows by {} {:?}",
                order.len(),
                spec.active,
                spec.direction
            );
            store.set_canonical(order);
        }
        None => {
            log_debug!(category::SORT, "sort cleared, restoring load order");
            store.restore_original_order();
        }
    }
}
