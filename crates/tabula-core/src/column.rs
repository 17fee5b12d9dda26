//! Column storage and the length/splice/coercion primitives tables build on.
//!
//! A column is either a resizable array of arbitrary cells or a fixed-length
//! numeric buffer. Numeric buffers never grow or shrink in place: every
//! resize or splice allocates a new buffer, mirroring how typed buffers
//! behave in the grid this table feeds.

use std::ops::Range;

use crate::cell::{parse_float_prefix, CellValue};

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Resizable array of dynamically typed cells.
    Cells(Vec<CellValue>),
    /// Fixed-length numeric buffer.
    Numbers(Box<[f64]>),
}

impl Default for Column {
    fn default() -> Self {
        Column::Cells(Vec::new())
    }
}

/// Result of [`splice`]: the removed values and the resulting column.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice {
    pub removed: Column,
    pub array: Column,
}

/// Result of [`splice_view`]: the removed span still borrowed from the
/// source column, and the resulting column.
#[derive(Debug)]
pub struct SpliceView<'a> {
    pub removed: ColumnView<'a>,
    pub array: Column,
}

/// Borrowed, read-only window over a column's storage.
///
/// The view aliases the column it came from; no values are copied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnView<'a> {
    Cells(&'a [CellValue]),
    Numbers(&'a [f64]),
}

impl ColumnView<'_> {
    pub fn len(&self) -> usize {
        match self {
            ColumnView::Cells(c) => c.len(),
            ColumnView::Numbers(n) => n.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<CellValue> {
        match self {
            ColumnView::Cells(c) => c.get(index).cloned(),
            ColumnView::Numbers(n) => n.get(index).copied().map(CellValue::Number),
        }
    }

    /// Detach the view into an owned column of the same kind.
    pub fn to_column(&self) -> Column {
        match self {
            ColumnView::Cells(c) => Column::Cells(c.to_vec()),
            ColumnView::Numbers(n) => Column::Numbers(n.to_vec().into_boxed_slice()),
        }
    }
}

impl Column {
    pub fn cells(values: Vec<CellValue>) -> Self {
        Column::Cells(values)
    }

    pub fn numbers(values: Vec<f64>) -> Self {
        Column::Numbers(values.into_boxed_slice())
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Cells(c) => c.len(),
            Column::Numbers(n) => n.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric_buffer(&self) -> bool {
        matches!(self, Column::Numbers(_))
    }

    pub fn get(&self, index: usize) -> Option<CellValue> {
        match self {
            Column::Cells(c) => c.get(index).cloned(),
            Column::Numbers(n) => n.get(index).copied().map(CellValue::Number),
        }
    }

    /// Overwrite one cell. Out-of-range writes are ignored; numeric buffers
    /// store the value's numeric form (`NaN` when it has none).
    pub fn set(&mut self, index: usize, value: CellValue) {
        match self {
            Column::Cells(c) => {
                if let Some(slot) = c.get_mut(index) {
                    *slot = value;
                }
            }
            Column::Numbers(n) => {
                if let Some(slot) = n.get_mut(index) {
                    *slot = convert_to_number_or_nan(&value);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = CellValue> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Borrow `range` (clamped to the column) without copying.
    pub fn view(&self, range: Range<usize>) -> ColumnView<'_> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        match self {
            Column::Cells(c) => ColumnView::Cells(&c[start..end]),
            Column::Numbers(n) => ColumnView::Numbers(&n[start..end]),
        }
    }

    /// Build a new column of the same kind holding the rows at `indices`.
    /// Indices past the end yield `Undefined` (or `NaN` in numeric buffers).
    pub fn gather(&self, indices: &[usize]) -> Column {
        match self {
            Column::Cells(c) => Column::Cells(
                indices
                    .iter()
                    .map(|&i| c.get(i).cloned().unwrap_or_default())
                    .collect(),
            ),
            Column::Numbers(n) => Column::Numbers(
                indices
                    .iter()
                    .map(|&i| n.get(i).copied().unwrap_or(f64::NAN))
                    .collect(),
            ),
        }
    }

    pub fn to_cells(&self) -> Vec<CellValue> {
        self.iter().collect()
    }
}

impl From<Vec<CellValue>> for Column {
    fn from(values: Vec<CellValue>) -> Self {
        Column::Cells(values)
    }
}

impl<T: Into<CellValue>> FromIterator<T> for Column {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Column::Cells(iter.into_iter().map(Into::into).collect())
    }
}

/// Return `column` resized to exactly `length`.
///
/// Cell arrays are truncated or padded with `Undefined` in place; numeric
/// buffers are reallocated and zero-padded.
pub fn set_length(column: Column, length: usize) -> Column {
    match column {
        Column::Cells(mut c) => {
            c.resize(length, CellValue::Undefined);
            Column::Cells(c)
        }
        Column::Numbers(n) => {
            let mut out = vec![0.0; length];
            let keep = n.len().min(length);
            out[..keep].copy_from_slice(&n[..keep]);
            Column::Numbers(out.into_boxed_slice())
        }
    }
}

/// Live view of the first `length` values of `column` (clamped to its length).
pub fn set_length_view(column: &Column, length: usize) -> ColumnView<'_> {
    column.view(0..length)
}

/// Mutable live view over the first `length` values of a numeric buffer.
/// Writes through the slice land in the column itself.
pub fn numbers_view_mut(column: &mut Column, length: usize) -> Option<&mut [f64]> {
    match column {
        Column::Numbers(n) => {
            let end = length.min(n.len());
            Some(&mut n[..end])
        }
        Column::Cells(_) => None,
    }
}

/// Remove `delete_count` values at `start` and insert `items` there.
///
/// `start` and `delete_count` are clamped to the column. Cell arrays are
/// spliced in place; numeric buffers always allocate a new buffer.
pub fn splice(column: Column, start: usize, delete_count: usize, items: Vec<CellValue>) -> Splice {
    let start = start.min(column.len());
    let end = start.saturating_add(delete_count).min(column.len());
    match column {
        Column::Cells(mut c) => {
            let removed: Vec<CellValue> = c.splice(start..end, items).collect();
            Splice {
                removed: Column::Cells(removed),
                array: Column::Cells(c),
            }
        }
        Column::Numbers(n) => {
            let removed = n[start..end].to_vec().into_boxed_slice();
            let mut out = Vec::with_capacity(n.len() - (end - start) + items.len());
            out.extend_from_slice(&n[..start]);
            out.extend(items.iter().map(convert_to_number_or_nan));
            out.extend_from_slice(&n[end..]);
            Splice {
                removed: Column::Numbers(removed),
                array: Column::Numbers(out.into_boxed_slice()),
            }
        }
    }
}

/// Like [`splice`], but `column` is left intact and the removed values are a
/// live view into it. The result is always a new column.
pub fn splice_view<'a>(
    column: &'a Column,
    start: usize,
    delete_count: usize,
    items: Vec<CellValue>,
) -> SpliceView<'a> {
    let start = start.min(column.len());
    let end = start.saturating_add(delete_count).min(column.len());
    let array = match column {
        Column::Cells(c) => {
            let mut out = Vec::with_capacity(c.len() - (end - start) + items.len());
            out.extend_from_slice(&c[..start]);
            out.extend(items);
            out.extend_from_slice(&c[end..]);
            Column::Cells(out)
        }
        Column::Numbers(n) => {
            let mut out = Vec::with_capacity(n.len() - (end - start) + items.len());
            out.extend_from_slice(&n[..start]);
            out.extend(items.iter().map(convert_to_number_or_nan));
            out.extend_from_slice(&n[end..]);
            Column::Numbers(out.into_boxed_slice())
        }
    };
    SpliceView {
        removed: column.view(start..end),
        array,
    }
}

/// Numeric form of a cell: booleans are `0`/`1`, numbers pass through, and
/// anything else goes through a leading-number parse. `None` on failure.
pub fn convert_to_number(value: &CellValue) -> Option<f64> {
    let n = convert_to_number_or_nan(value);
    (!n.is_nan()).then_some(n)
}

/// Like [`convert_to_number`], but reports failure as `NaN`.
pub fn convert_to_number_or_nan(value: &CellValue) -> f64 {
    match value {
        CellValue::Bool(b) => f64::from(u8::from(*b)),
        CellValue::Number(n) => *n,
        CellValue::Str(s) => parse_float_prefix(s).unwrap_or(f64::NAN),
        CellValue::Undefined | CellValue::Null => f64::NAN,
    }
}
