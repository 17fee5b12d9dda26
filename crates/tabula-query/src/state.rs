//! Serializable snapshot of every controller's options.
//!
//! ```yaml
//! sorting:
//!   - columnId: price
//!     order: desc
//! filtering:
//!   - columnId: name
//!     operator: contains
//!     value: an
//! pagination:
//!   enabled: true
//!   page: 1
//!   pageSize: 20
//! ```

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::filtering::ColumnFilterState;
use crate::pagination::PaginationState;
use crate::sorting::SortingState;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryState {
    pub sorting: Vec<SortingState>,
    pub filtering: Vec<ColumnFilterState>,
    pub pagination: PaginationState,
}

impl QueryState {
    pub fn from_json(s: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, QueryError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_yaml(s: &str) -> Result<Self, QueryError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn to_yaml(&self) -> Result<String, QueryError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Filters that would be dropped when loaded, with the reason.
    pub fn invalid_filters(&self) -> Vec<(String, String)> {
        self.filtering
            .iter()
            .filter_map(|f| {
                f.to_condition()
                    .err()
                    .map(|e| (f.column_id.clone(), e.to_string()))
            })
            .collect()
    }

    /// Sorted columns beyond the first, which the sorting controller ignores.
    pub fn ignored_sortings(&self) -> Vec<&str> {
        self.sorting
            .iter()
            .filter(|s| s.order.is_some())
            .skip(1)
            .map(|s| s.column_id.as_str())
            .collect()
    }
}
