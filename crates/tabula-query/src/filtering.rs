//! Filtering controller: one condition per column, combined with `and`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabula_core::prelude::*;
use tabula_modifiers::{Condition, ConditionError, FilterModifier};

/// Persisted form of one column's filter.
///
/// Either `operator` (+ `value`) or a full `condition` tree is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnFilterState {
    pub column_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "is_undefined")]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

fn is_undefined(value: &CellValue) -> bool {
    matches!(value, CellValue::Undefined)
}

impl ColumnFilterState {
    /// Resolve into a condition, accepting the friendly operator aliases.
    pub fn to_condition(&self) -> Result<Condition, ConditionError> {
        if let Some(condition) = &self.condition {
            return Ok(condition.clone());
        }
        let operator = self
            .operator
            .as_deref()
            .ok_or_else(|| ConditionError::MissingOperator(self.column_id.clone()))?;
        let condition = Condition::from_parts(self.column_id.clone(), operator, self.value.clone())?;
        Ok(match self.ignore_case {
            Some(flag) => condition.with_default_ignore_case(flag),
            None => condition,
        })
    }
}

#[derive(Debug, Clone)]
struct ColumnFilter {
    state: ColumnFilterState,
    condition: Condition,
}

#[derive(Debug, Default)]
pub struct FilteringController {
    columns: BTreeMap<String, ColumnFilter>,
    case_sensitive: bool,
    dirty: bool,
}

impl FilteringController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &GridConfig) -> Self {
        Self {
            case_sensitive: config.case_sensitive_filters,
            ..Self::default()
        }
    }

    /// Filter `column_id` with an operator name as the UI hands it over.
    ///
    /// Unknown operators are dropped with a warning and leave the current
    /// filter for that column in place. Returns whether the filter was taken.
    pub fn add_column_filter(
        &mut self,
        column_id: impl Into<String>,
        operator: &str,
        value: impl Into<CellValue>,
    ) -> bool {
        let state = ColumnFilterState {
            column_id: column_id.into(),
            operator: Some(operator.to_string()),
            value: value.into(),
            ..ColumnFilterState::default()
        };
        self.accept(state)
    }

    pub fn add_column_filter_condition(&mut self, column_id: impl Into<String>, condition: Condition) {
        let column_id = column_id.into();
        let state = ColumnFilterState {
            column_id: column_id.clone(),
            condition: Some(condition.clone()),
            ..ColumnFilterState::default()
        };
        self.insert(column_id, ColumnFilter { state, condition });
    }

    pub fn clear_column_filtering(&mut self, column_id: &str) -> bool {
        let removed = self.columns.remove(column_id).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn clear(&mut self) {
        if !self.columns.is_empty() {
            self.columns.clear();
            self.dirty = true;
        }
    }

    /// Replace every column filter. Returns the number of entries dropped
    /// as invalid.
    pub fn load(&mut self, states: &[ColumnFilterState]) -> usize {
        self.clear();
        let mut dropped = 0;
        for state in states {
            if !self.accept(state.clone()) {
                dropped += 1;
            }
        }
        dropped
    }

    pub fn active_columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// One `and` over every active column condition, or `None` when no
    /// column is filtered.
    pub fn condition(&self) -> Option<Condition> {
        if self.columns.is_empty() {
            return None;
        }
        let parts = self
            .columns
            .values()
            .map(|f| f.condition.clone().with_default_ignore_case(!self.case_sensitive))
            .collect();
        Some(Condition::and(parts))
    }

    pub fn modifier(&self) -> Option<FilterModifier> {
        self.condition().map(FilterModifier::new)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn state(&self) -> Vec<ColumnFilterState> {
        self.columns.values().map(|f| f.state.clone()).collect()
    }

    fn accept(&mut self, state: ColumnFilterState) -> bool {
        match state.to_condition() {
            Ok(condition) => {
                self.insert(state.column_id.clone(), ColumnFilter { state, condition });
                true
            }
            Err(err) => {
                tracing::warn!(column = %state.column_id, error = %err, "dropping column filter");
                false
            }
        }
    }

    fn insert(&mut self, column_id: String, filter: ColumnFilter) {
        let changed = self
            .columns
            .get(&column_id)
            .map_or(true, |existing| existing.condition != filter.condition);
        self.columns.insert(column_id, filter);
        self.dirty |= changed;
    }
}
