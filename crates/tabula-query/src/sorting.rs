//! Sorting controller: at most one sorted column.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tabula_modifiers::{Comparator, SortDirection, SortModifier};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortingState {
    pub column_id: String,
    /// `None` means the column is not sorted.
    #[serde(default)]
    pub order: Option<SortDirection>,
}

#[derive(Default)]
pub struct SortingController {
    current: Option<SortingState>,
    compares: HashMap<String, Comparator>,
    dirty: bool,
}

impl fmt::Debug for SortingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortingController")
            .field("current", &self.current)
            .field("compares", &self.compares.keys().collect::<Vec<_>>())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl SortingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort by `column_id`, or stop sorting when `order` is `None`.
    pub fn set_sorting(&mut self, order: Option<SortDirection>, column_id: impl Into<String>) {
        let next = order.map(|order| SortingState {
            column_id: column_id.into(),
            order: Some(order),
        });
        if next != self.current {
            self.current = next;
            self.dirty = true;
        }
    }

    /// Apply a list of requested sortings. Only the first sorted column is
    /// honored; the rest are dropped with a warning.
    pub fn load(&mut self, states: &[SortingState]) {
        let mut sorted = states.iter().filter(|s| s.order.is_some());
        let first = sorted.next().cloned();
        let ignored: Vec<&str> = sorted.map(|s| s.column_id.as_str()).collect();
        if !ignored.is_empty() {
            tracing::warn!(
                kept = first.as_ref().map(|s| s.column_id.as_str()).unwrap_or_default(),
                ?ignored,
                "only one sorted column is supported"
            );
        }
        match first {
            Some(SortingState { column_id, order }) => self.set_sorting(order, column_id),
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            self.dirty = true;
        }
    }

    /// Register a comparator used whenever `column_id` is the sorted column.
    pub fn set_compare(&mut self, column_id: impl Into<String>, compare: Comparator) {
        let column_id = column_id.into();
        if self.is_sorted_by(&column_id) {
            self.dirty = true;
        }
        self.compares.insert(column_id, compare);
    }

    pub fn remove_compare(&mut self, column_id: &str) -> bool {
        let removed = self.compares.remove(column_id).is_some();
        if removed && self.is_sorted_by(column_id) {
            self.dirty = true;
        }
        removed
    }

    pub fn current_sorting(&self) -> Option<&SortingState> {
        self.current.as_ref()
    }

    /// Build the sort modifier for the current options, if any.
    pub fn modifier(&self) -> Option<SortModifier> {
        let state = self.current.as_ref()?;
        let order = state.order?;
        let modifier = SortModifier::new(state.column_id.clone(), order);
        Some(match self.compares.get(&state.column_id) {
            Some(compare) => modifier.with_compare(compare.clone()),
            None => modifier,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn state(&self) -> Vec<SortingState> {
        self.current.iter().cloned().collect()
    }

    fn is_sorted_by(&self, column_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.column_id == column_id)
    }
}
