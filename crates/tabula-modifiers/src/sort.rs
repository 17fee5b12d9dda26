//! Single-column stable sort.
//!
//! Key values are read once, the row order is sorted, and every column is
//! gathered into the presentation in that order. Equal keys keep their
//! source order in both directions.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabula_core::prelude::*;

use crate::present::present_rows;

/// User comparator over two cells. `Err` aborts the sort.
pub type Comparator =
    Arc<dyn Fn(&CellValue, &CellValue) -> Result<Ordering, CallbackError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ModifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(ModifierError::Invalid(format!("unknown sort order '{other}'"))),
        }
    }
}

pub struct SortModifier {
    column_id: String,
    direction: SortDirection,
    compare: Option<Comparator>,
    events: EventEmitter<ModifierEvent>,
}

impl fmt::Debug for SortModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortModifier")
            .field("column_id", &self.column_id)
            .field("direction", &self.direction)
            .field("custom_compare", &self.compare.is_some())
            .finish()
    }
}

impl SortModifier {
    pub fn new(column_id: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
            compare: None,
            events: EventEmitter::new(),
        }
    }

    /// Replace the built-in ordering. The comparator always describes
    /// ascending order; `Desc` flips its result.
    pub fn with_compare(mut self, compare: Comparator) -> Self {
        self.compare = Some(compare);
        self
    }

    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn has_custom_compare(&self) -> bool {
        self.compare.is_some()
    }

    fn sorted_order(&self, values: &[CellValue]) -> Result<Vec<usize>, CallbackError> {
        let desc = self.direction == SortDirection::Desc;
        match &self.compare {
            None => {
                let keys: Vec<SortKey> = values.iter().map(SortKey::of).collect();
                let mut order: Vec<usize> = (0..values.len()).collect();
                // `sort_by` is stable; comparing (b, a) keeps ties in source order.
                if desc {
                    order.sort_by(|&a, &b| keys[b].compare(&keys[a]));
                } else {
                    order.sort_by(|&a, &b| keys[a].compare(&keys[b]));
                }
                Ok(order)
            }
            Some(compare) => try_sort_indices(values.len(), |a, b| -> Result<Ordering, CallbackError> {
                let ord = compare(&values[a], &values[b])?;
                Ok(if desc { ord.reverse() } else { ord })
            }),
        }
    }
}

impl Modifier for SortModifier {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn events(&self) -> &EventEmitter<ModifierEvent> {
        &self.events
    }

    fn modify_table(&self, table: &mut Table) -> Result<(), ModifierError> {
        let row_count = table.get_row_count();
        let values: Vec<CellValue> = match table.get_column(&self.column_id) {
            Some(column) => (0..row_count)
                .map(|i| column.get(i).unwrap_or_default())
                .collect(),
            None => vec![CellValue::Undefined; row_count],
        };

        let order = self
            .sorted_order(&values)
            .map_err(|source| ModifierError::Callback {
                modifier: self.name(),
                source,
            })?;
        present_rows(table, &order);

        tracing::trace!(
            column = %self.column_id,
            direction = %self.direction,
            rows = row_count,
            "sorted rows"
        );
        Ok(())
    }
}

/// Total-order key used by the built-in comparator.
///
/// Falsy cells count as `0`, booleans as `0`/`1`, and strings that read as
/// numbers as those numbers. Numbers order before the remaining strings,
/// which compare lexicographically.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: &CellValue) -> SortKey {
        match value.or_zero() {
            CellValue::Number(n) => SortKey::Number(n),
            CellValue::Bool(b) => SortKey::Number(f64::from(u8::from(b))),
            CellValue::Str(s) => {
                let n = value.to_number();
                if n.is_nan() {
                    SortKey::Text(s)
                } else {
                    SortKey::Number(n)
                }
            }
            CellValue::Undefined | CellValue::Null => SortKey::Number(0.0),
        }
    }

    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            // `or_zero` already removed NaN.
            (SortKey::Number(a), SortKey::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (SortKey::Number(_), SortKey::Text(_)) => Ordering::Less,
            (SortKey::Text(_), SortKey::Number(_)) => Ordering::Greater,
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
        }
    }
}

/// Stable bottom-up merge sort of `0..len` with a fallible comparator.
///
/// Never panics on inconsistent comparators and stops at the first error.
pub(crate) fn try_sort_indices<E>(
    len: usize,
    mut compare: impl FnMut(usize, usize) -> Result<Ordering, E>,
) -> Result<Vec<usize>, E> {
    let mut src: Vec<usize> = (0..len).collect();
    let mut dst: Vec<usize> = vec![0; len];
    let mut width = 1;
    while width < len {
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j, mut k) = (start, mid, start);
            while i < mid && j < end {
                // Take from the right run only when strictly smaller.
                if compare(src[j], src[i])? == Ordering::Less {
                    dst[k] = src[j];
                    j += 1;
                } else {
                    dst[k] = src[i];
                    i += 1;
                }
                k += 1;
            }
            dst[k..k + (mid - i)].copy_from_slice(&src[i..mid]);
            k += mid - i;
            dst[k..k + (end - j)].copy_from_slice(&src[j..end]);
            start = end;
        }
        std::mem::swap(&mut src, &mut dst);
        width *= 2;
    }
    Ok(src)
}
