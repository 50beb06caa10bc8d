//! FILENAME: core/table-engine/src/pagination.rs
//! Pagination Stage - slices the visible flattened sequence into pages.
//!
//! Group headers occupy page slots like any other entry. The totals
//! reported to the caller count member rows only.

use serde::{Deserialize, Serialize};

use crate::definition::{PaginationConfig, DEFAULT_PAGE_SIZE};

/// Current page position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub page_index: usize,
    pub page_size: usize,
    pub show_all: bool,
}

impl Default for PageState {
    fn default() -> Self {
        PageState {
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            show_all: false,
        }
    }
}

impl PageState {
    pub fn from_config(config: Option<&PaginationConfig>) -> Self {
        PageState {
            page_size: config.map(PaginationConfig::page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            ..PageState::default()
        }
    }

    /// Moves to a page. Leaves show-all mode. The index is not clamped.
    pub fn set_page(&mut self, page_index: usize, page_size: usize) {
        self.page_index = page_index;
        self.page_size = page_size;
        self.show_all = false;
    }

    /// Turning show-all on resets the page index; turning it off keeps it.
    pub fn set_show_all(&mut self, show_all: bool) {
        self.show_all = show_all;
        if show_all {
            self.page_index = 0;
        }
    }

    pub fn toggle_show_all(&mut self) {
        self.set_show_all(!self.show_all);
    }

    /// True when a slice is actually taken.
    pub fn is_slicing(&self, pagination_enabled: bool) -> bool {
        pagination_enabled && !self.show_all && self.page_size > 0
    }

    /// Returns the current page of `entries` (everything when not slicing).
    pub fn slice<'a, T>(&self, entries: &'a [T], pagination_enabled: bool) -> &'a [T] {
        if !self.is_slicing(pagination_enabled) {
            return entries;
        }
        let start = self.page_index.saturating_mul(self.page_size).min(entries.len());
        let end = start.saturating_add(self.page_size).min(entries.len());
        &entries[start..end]
    }

    /// Number of pages for `total_rows` member rows (0 when empty). Without
    /// slicing everything is one page.
    pub fn page_count(&self, total_rows: usize, pagination_enabled: bool) -> usize {
        if total_rows == 0 || self.page_size == 0 {
            return 0;
        }
        if !self.is_slicing(pagination_enabled) {
            return 1;
        }
        total_rows.div_ceil(self.page_size)
    }

    /// Member rows covered by the current page.
    pub fn displayed_rows_count(&self, total_rows: usize, pagination_enabled: bool) -> usize {
        if !self.is_slicing(pagination_enabled) {
            return total_rows;
        }
        let (start, end) = self.row_range(total_rows);
        end.saturating_sub(start)
    }

    /// "11-15 of 15", or "Showing all 15 rows" in show-all mode.
    pub fn pagination_info(&self, total_rows: usize, pagination_enabled: bool) -> String {
        if self.show_all {
            return format!("Showing all {} rows", total_rows);
        }
        if total_rows == 0 {
            return "0-0 of 0".to_string();
        }
        if !self.is_slicing(pagination_enabled) {
            return format!("1-{} of {}", total_rows, total_rows);
        }
        let (start, end) = self.row_range(total_rows);
        format!("{}-{} of {}", start + 1, end, total_rows)
    }

    /// Zero-based member row range of the current page, clamped to the total.
    fn row_range(&self, total_rows: usize) -> (usize, usize) {
        let start = self.page_index.saturating_mul(self.page_size);
        let end = start.saturating_add(self.page_size).min(total_rows);
        (start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_page_of_fifteen() {
        let rows: Vec<usize> = (1..=15).collect();
        let mut page = PageState::default();
        page.set_page(1, 10);

        assert_eq!(page.slice(&rows, true), &[11, 12, 13, 14, 15]);
        assert_eq!(page.pagination_info(15, true), "11-15 of 15");
        assert_eq!(page.displayed_rows_count(15, true), 5);
        assert_eq!(page.page_count(15, true), 2);
    }

    #[test]
    fn test_disabled_or_show_all_returns_everything() {
        let rows: Vec<usize> = (0..30).collect();
        let mut page = PageState::default();
        assert_eq!(page.slice(&rows, false).len(), 30);

        page.set_page(2, 10);
        page.toggle_show_all();
        assert_eq!(page.page_index, 0);
        assert_eq!(page.slice(&rows, true).len(), 30);
        assert_eq!(page.pagination_info(30, true), "Showing all 30 rows");
        assert_eq!(page.displayed_rows_count(30, true), 30);
        assert_eq!(page.page_count(30, true), 1);
    }

    #[test]
    fn test_turning_show_all_off_keeps_index() {
        let mut page = PageState::default();
        page.set_show_all(true);
        page.page_index = 3;
        page.set_show_all(false);
        assert_eq!(page.page_index, 3);
    }

    #[test]
    fn test_out_of_range_page_is_empty() {
        let rows: Vec<usize> = (0..5).collect();
        let mut page = PageState::default();
        page.set_page(4, 10);
        assert!(page.slice(&rows, true).is_empty());
        assert_eq!(page.displayed_rows_count(5, true), 0);
    }

    #[test]
    fn test_empty_info() {
        assert_eq!(PageState::default().pagination_info(0, true), "0-0 of 0");
        assert_eq!(PageState::default().page_count(0, true), 0);
    }

    #[test]
    fn test_disabled_pagination_reports_one_page() {
        let mut page = PageState::default();
        page.set_page(1, 10);
        assert_eq!(page.pagination_info(15, false), "1-15 of 15");
        assert_eq!(page.displayed_rows_count(15, false), 15);
        assert_eq!(page.page_count(15, false), 1);
        assert_eq!(page.pagination_info(0, false), "0-0 of 0");
    }
}
