//! Pagination controller: a 1-based page over the filtered rows.

use serde::{Deserialize, Serialize};
use tabula_core::prelude::*;
use tabula_modifiers::RangeModifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationState {
    pub enabled: bool,
    pub page: usize,
    pub page_size: usize,
}

impl Default for PaginationState {
    fn default() -> Self {
        let config = GridConfig::default();
        Self {
            enabled: config.pagination_enabled,
            page: config.initial_page,
            page_size: config.default_page_size,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginationController {
    current_page: usize,
    page_size: usize,
    enabled: bool,
    page_size_options: Vec<usize>,
    /// Row count before pagination as of the last recompute.
    total_items: usize,
    dirty: bool,
}

impl Default for PaginationController {
    fn default() -> Self {
        Self::with_config(&GridConfig::default())
    }
}

impl PaginationController {
    pub fn new(page_size: usize) -> Self {
        let mut c = Self::default();
        c.set_page_size(page_size);
        c.dirty = false;
        c
    }

    pub fn with_config(config: &GridConfig) -> Self {
        Self {
            current_page: config.initial_page.max(1),
            page_size: config.default_page_size.max(1),
            enabled: config.pagination_enabled,
            page_size_options: config.page_size_options.clone(),
            total_items: 0,
            dirty: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.dirty = true;
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_size_options(&self) -> &[usize] {
        &self.page_size_options
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// Number of pages for the last known row count; never below 1.
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size).max(1)
    }

    /// Go to `page`. Page 0 reads as 1; the upper bound is applied by
    /// [`clamp_page`](Self::clamp_page) once the row count is known.
    pub fn set_page(&mut self, page: usize) {
        let page = page.max(1);
        if page != self.current_page {
            self.current_page = page;
            self.dirty = true;
        }
    }

    /// Change the page size and return to the first page. Zero is ignored.
    pub fn set_page_size(&mut self, page_size: usize) {
        if page_size == 0 {
            tracing::warn!("ignoring page size 0");
            return;
        }
        if page_size != self.page_size || self.current_page != 1 {
            self.page_size = page_size;
            self.current_page = 1;
            self.dirty = true;
        }
    }

    pub fn next_page(&mut self) {
        if self.current_page < self.total_pages() {
            self.set_page(self.current_page + 1);
        }
    }

    pub fn previous_page(&mut self) {
        if self.current_page > 1 {
            self.set_page(self.current_page - 1);
        }
    }

    pub fn first_page(&mut self) {
        self.set_page(1);
    }

    pub fn last_page(&mut self) {
        self.set_page(self.total_pages());
    }

    /// Cap the current page at the last page for the known row count.
    pub fn clamp_page(&mut self) {
        let last = self.total_pages();
        if self.current_page > last {
            self.current_page = last;
        }
    }

    /// Window for the current page over `total_rows` rows, or `None` while
    /// pagination is disabled.
    pub fn create_modifier(&mut self, total_rows: usize) -> Option<RangeModifier> {
        self.total_items = total_rows;
        if !self.enabled {
            return None;
        }
        self.clamp_page();
        let start = (self.current_page - 1) * self.page_size;
        let end = (self.current_page * self.page_size).min(total_rows);
        Some(RangeModifier::new(start, end))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn state(&self) -> PaginationState {
        PaginationState {
            enabled: self.enabled,
            page: self.current_page,
            page_size: self.page_size,
        }
    }

    /// Apply a persisted state. The page is clamped on the next recompute.
    pub fn load(&mut self, state: &PaginationState) {
        self.set_enabled(state.enabled);
        self.set_page_size(state.page_size);
        let page = state.page.max(1);
        if page != self.current_page {
            self.current_page = page;
            self.dirty = true;
        }
    }
}
