//! The columnar `Table`.
//!
//! A table owns named columns that always share one length (`row_count`), a
//! version tag that changes on every mutation, and optionally:
//! - an attached [`Modifier`] plus the presentation table it derives,
//! - `original_row_indexes` (presentation row -> source row) and the inverse
//!   `local_row_indexes`, present only on derived tables.
//!
//! Columns are shared between a table and its clones through `Arc`; the
//! first write on either side detaches that column (copy-on-write).
//!
//! Mutators never fail. Out-of-range reads return `None`, out-of-range
//! deletes are no-ops, and writes past the end grow the table.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::cell::CellValue;
use crate::column::{self, Column, Splice};
use crate::error::Result;
use crate::events::{EventEmitter, TableEvent, TableEventKind};
use crate::id::{SubscriptionId, VersionTag};
use crate::modifier::{Modifier, ModifierError};

pub type RowObject = HashMap<String, CellValue>;

/// A row handed to [`Table::set_rows`].
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Values in the table's column order; extra values are ignored.
    Values(Vec<CellValue>),
    /// Values keyed by column id; unknown ids create new columns.
    Object(RowObject),
}

impl From<Vec<CellValue>> for Row {
    fn from(values: Vec<CellValue>) -> Self {
        Row::Values(values)
    }
}

impl From<RowObject> for Row {
    fn from(values: RowObject) -> Self {
        Row::Object(values)
    }
}

#[derive(Debug, Clone)]
struct ColumnSlot {
    id: String,
    data: Arc<Column>,
}

pub struct Table {
    id: String,
    columns: Vec<ColumnSlot>,
    row_count: usize,
    version_tag: VersionTag,
    presentation: Option<Box<Table>>,
    modifier: Option<Arc<dyn Modifier>>,
    original_row_indexes: Option<Vec<usize>>,
    local_row_indexes: Option<Vec<Option<usize>>>,
    events: EventEmitter<TableEvent>,
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("id", &self.id)
            .field("columns", &self.get_column_ids().collect::<Vec<_>>())
            .field("row_count", &self.row_count)
            .field("version_tag", &self.version_tag)
            .field("modifier", &self.modifier.as_ref().map(|m| m.name()))
            .field("presentation", &self.presentation)
            .finish()
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Create an empty table with a generated id.
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            columns: Vec::new(),
            row_count: 0,
            version_tag: VersionTag::next(),
            presentation: None,
            modifier: None,
            original_row_indexes: None,
            local_row_indexes: None,
            events: EventEmitter::new(),
        }
    }

    /// Builder form of [`Table::set_columns`].
    pub fn with_columns<I, K>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (K, Column)>,
        K: Into<String>,
    {
        self.set_columns(columns, None);
        self
    }

    /// Build a table from a JSON array of row objects. Columns come out in
    /// first-seen key order; keys missing from a row are left `Undefined`.
    pub fn from_json_rows(text: &str) -> Result<Table> {
        let rows: Vec<serde_json::Map<String, serde_json::Value>> = serde_json::from_str(text)?;

        let mut seen = HashSet::new();
        let mut column_ids = Vec::new();
        for key in rows.iter().flat_map(|row| row.keys()) {
            if seen.insert(key.as_str()) {
                column_ids.push(key.clone());
            }
        }

        let columns: Vec<(String, Column)> = column_ids
            .into_iter()
            .map(|id| {
                let cells = rows
                    .iter()
                    .map(|row| row.get(&id).map_or(CellValue::Undefined, CellValue::from))
                    .collect();
                (id, Column::Cells(cells))
            })
            .collect();
        Ok(Table::new().with_columns(columns))
    }

    // --- read surface ---

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version_tag(&self) -> VersionTag {
        self.version_tag
    }

    pub fn get_row_count(&self) -> usize {
        self.row_count
    }

    pub fn get_column(&self, column_id: &str) -> Option<&Column> {
        self.slot(column_id).map(|s| s.data.as_ref())
    }

    pub fn has_column(&self, column_id: &str) -> bool {
        self.slot(column_id).is_some()
    }

    pub fn get_column_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|s| s.id.as_str())
    }

    pub fn get_columns(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.columns.iter().map(|s| (s.id.as_str(), s.data.as_ref()))
    }

    pub fn get_cell(&self, column_id: &str, row_index: usize) -> Option<CellValue> {
        if row_index >= self.row_count {
            return None;
        }
        self.get_column(column_id)?.get(row_index)
    }

    /// Values of one row in column order.
    pub fn get_row(&self, row_index: usize) -> Option<Vec<CellValue>> {
        (row_index < self.row_count).then(|| {
            self.columns
                .iter()
                .map(|s| s.data.get(row_index).unwrap_or_default())
                .collect()
        })
    }

    pub fn get_row_object(&self, row_index: usize) -> Option<RowObject> {
        self.row(row_index).map(|r| r.to_object())
    }

    pub fn row(&self, row_index: usize) -> Option<RowRef<'_>> {
        (row_index < self.row_count).then_some(RowRef {
            table: self,
            index: row_index,
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> + '_ {
        (0..self.row_count).map(move |index| RowRef { table: self, index })
    }

    /// First row at or after `start` whose cell strictly equals `value`.
    pub fn get_row_index_by(
        &self,
        column_id: &str,
        value: &CellValue,
        start: usize,
    ) -> Option<usize> {
        let column = self.get_column(column_id)?;
        (start..self.row_count).find(|&i| column.get(i).is_some_and(|c| c.strict_eq(value)))
    }

    /// Source row behind `row_index`; identity when this table is not derived.
    pub fn get_original_row_index(&self, row_index: usize) -> Option<usize> {
        match &self.original_row_indexes {
            Some(map) => map.get(row_index).copied(),
            None => Some(row_index),
        }
    }

    /// Row of this table that shows source row `original_row_index`;
    /// identity when this table is not derived.
    pub fn get_local_row_index(&self, original_row_index: usize) -> Option<usize> {
        match (&self.local_row_indexes, &self.original_row_indexes) {
            (Some(local), _) => local.get(original_row_index).copied().flatten(),
            (None, Some(original)) => original.iter().position(|&o| o == original_row_index),
            (None, None) => Some(original_row_index),
        }
    }

    pub fn original_row_indexes(&self) -> Option<&[usize]> {
        self.original_row_indexes.as_deref()
    }

    /// The presentation table, or `self` when nothing is attached.
    pub fn get_modified(&self) -> &Table {
        self.presentation.as_deref().unwrap_or(self)
    }

    pub fn has_presentation(&self) -> bool {
        self.presentation.is_some()
    }

    pub fn modifier(&self) -> Option<&Arc<dyn Modifier>> {
        self.modifier.as_ref()
    }

    // --- observers ---

    pub fn events(&self) -> &EventEmitter<TableEvent> {
        &self.events
    }

    pub fn on<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&TableEvent) + Send + 'static,
    {
        self.events.on(listener)
    }

    /// Subscribe to a single event kind.
    pub fn on_kind<F>(&self, kind: TableEventKind, mut listener: F) -> SubscriptionId
    where
        F: FnMut(&TableEvent) + Send + 'static,
    {
        self.events.on(move |e: &TableEvent| {
            if e.kind() == kind {
                listener(e);
            }
        })
    }

    pub fn off(&self, id: SubscriptionId) -> bool {
        self.events.off(id)
    }

    pub(crate) fn emit(&self, event: &TableEvent) {
        self.events.emit(event);
    }

    // --- mutation ---

    /// Write whole columns (`row_index = None`) or column values starting at
    /// `row_index`. The row count grows to fit the longest incoming column;
    /// shorter columns are padded.
    pub fn set_columns<I, K>(&mut self, columns: I, row_index: Option<usize>)
    where
        I: IntoIterator<Item = (K, Column)>,
        K: Into<String>,
    {
        let columns: Vec<(String, Column)> =
            columns.into_iter().map(|(k, c)| (k.into(), c)).collect();
        if let Some(start) = row_index {
            let longest = columns.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
            if row_end(start, longest).is_none() {
                return;
            }
        }
        let column_ids: Vec<String> = columns.iter().map(|(id, _)| id.clone()).collect();
        self.emit(&TableEvent::SetColumns {
            column_ids: column_ids.clone(),
            row_index,
        });

        let mut row_count = self.row_count;
        for (id, incoming) in columns {
            match row_index {
                None => {
                    row_count = row_count.max(incoming.len());
                    self.replace_column(id, incoming);
                }
                Some(start) => {
                    let end = start + incoming.len();
                    row_count = row_count.max(end);
                    let target = self.column_mut(&id);
                    if target.len() < end {
                        let taken = std::mem::take(target);
                        *target = column::set_length(taken, end);
                    }
                    for (offset, value) in incoming.iter().enumerate() {
                        target.set(start + offset, value);
                    }
                }
            }
        }
        self.row_count = row_count;
        self.normalize_lengths();
        self.touch();

        self.emit(&TableEvent::AfterSetColumns {
            column_ids,
            row_index,
        });
        self.rederive();
    }

    pub fn set_column(&mut self, column_id: impl Into<String>, column: Column) {
        self.set_columns([(column_id.into(), column)], None);
    }

    /// Remove columns; returns what was removed. Removing the last column
    /// empties the table.
    pub fn delete_columns(&mut self, column_ids: &[&str]) -> Vec<(String, Column)> {
        let ids: Vec<String> = column_ids.iter().map(|s| s.to_string()).collect();
        self.emit(&TableEvent::DeleteColumns {
            column_ids: ids.clone(),
        });

        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.columns.len());
        for slot in self.columns.drain(..) {
            if ids.contains(&slot.id) {
                let data = Arc::try_unwrap(slot.data).unwrap_or_else(|shared| (*shared).clone());
                removed.push((slot.id, data));
            } else {
                kept.push(slot);
            }
        }
        self.columns = kept;
        if self.columns.is_empty() {
            self.row_count = 0;
        }
        self.touch();

        self.emit(&TableEvent::AfterDeleteColumns { column_ids: ids });
        self.rederive();
        removed
    }

    pub fn set_row(&mut self, row: Row, row_index: Option<usize>, insert: bool) {
        self.set_rows(vec![row], row_index, insert);
    }

    /// Write rows at `row_index` (append when `None`). With `insert`, later
    /// rows shift down instead of being overwritten.
    pub fn set_rows(&mut self, rows: Vec<Row>, row_index: Option<usize>, insert: bool) {
        let start = row_index.unwrap_or(self.row_count);
        let count = rows.len();
        let Some(end) = row_end(start, count) else {
            return;
        };
        self.emit(&TableEvent::SetRows {
            row_index: start,
            row_count: count,
            insert,
        });

        if insert && start < self.row_count && count > 0 {
            for slot in &mut self.columns {
                let col = Arc::make_mut(&mut slot.data);
                let taken = std::mem::take(col);
                *col = column::splice(taken, start, 0, vec![CellValue::Undefined; count]).array;
            }
            self.row_count += count;
        }
        if end > self.row_count {
            self.row_count = end;
            self.normalize_lengths();
        }

        for (offset, row) in rows.into_iter().enumerate() {
            let target = start + offset;
            match row {
                Row::Values(values) => {
                    for (slot, value) in self.columns.iter_mut().zip(values) {
                        Arc::make_mut(&mut slot.data).set(target, value);
                    }
                }
                Row::Object(values) => {
                    for (id, value) in values {
                        self.column_mut(&id).set(target, value);
                    }
                }
            }
        }
        self.touch();

        self.emit(&TableEvent::AfterSetRows {
            row_index: start,
            row_count: count,
            insert,
        });
        self.rederive();
    }

    /// Delete `row_count` rows at `row_index`, or every row when `row_index`
    /// is `None`. Returns the deleted rows in column order.
    pub fn delete_rows(&mut self, row_index: Option<usize>, row_count: usize) -> Vec<Vec<CellValue>> {
        let (start, requested) = match row_index {
            Some(i) => (i, row_count),
            None => (0, self.row_count),
        };
        if start >= self.row_count || requested == 0 {
            return Vec::new();
        }
        let count = requested.min(self.row_count - start);
        self.emit(&TableEvent::DeleteRows {
            row_index: start,
            row_count: count,
        });

        let mut deleted = vec![Vec::with_capacity(self.columns.len()); count];
        for slot in &mut self.columns {
            let col = Arc::make_mut(&mut slot.data);
            let taken = std::mem::take(col);
            let Splice { removed, array } = column::splice(taken, start, count, Vec::new());
            *col = array;
            for (row, value) in deleted.iter_mut().zip(removed.iter()) {
                row.push(value);
            }
        }
        self.row_count -= count;
        self.touch();

        self.emit(&TableEvent::AfterDeleteRows {
            row_index: start,
            row_count: count,
        });
        self.rederive();
        deleted
    }

    /// Write one cell, creating the column or growing the table as needed.
    pub fn set_cell(&mut self, column_id: &str, row_index: usize, value: CellValue) {
        let Some(end) = row_end(row_index, 1) else {
            return;
        };
        self.emit(&TableEvent::SetCell {
            column_id: column_id.to_string(),
            row_index,
        });

        if end > self.row_count {
            self.row_count = end;
            self.normalize_lengths();
        }
        self.column_mut(column_id).set(row_index, value);
        self.touch();

        self.emit(&TableEvent::AfterSetCell {
            column_id: column_id.to_string(),
            row_index,
        });
        self.rederive();
    }

    /// Store the presentation -> source map and, unless `omit_local`, derive
    /// the inverse map in the same pass.
    pub fn set_original_row_indexes(&mut self, mapping: Vec<usize>, omit_local: bool) {
        self.local_row_indexes = if omit_local {
            None
        } else {
            let size = mapping.iter().max().map_or(0, |&m| m + 1);
            let mut local = vec![None; size];
            for (i, &original) in mapping.iter().enumerate() {
                local[original] = Some(i);
            }
            Some(local)
        };
        self.original_row_indexes = Some(mapping);
    }

    /// Attach (or detach with `None`) a modifier and derive the presentation
    /// immediately.
    pub fn set_modifier(&mut self, modifier: Option<Arc<dyn Modifier>>) -> Result<(), ModifierError> {
        self.modifier = modifier.clone();
        match modifier {
            Some(m) => m.modify(self),
            None => {
                self.presentation = None;
                Ok(())
            }
        }
    }

    /// Copy this table. Columns are shared until either side writes them.
    /// With `skip_columns`, the clone keeps only the id.
    ///
    /// A full clone also carries the version tag and row-index maps, so it is
    /// the same logical view until its first write.
    pub fn clone_table(&self, skip_columns: bool) -> Table {
        self.emit(&TableEvent::CloneTable {
            table_id: self.id.clone(),
        });

        let mut clone = Table::with_id(self.id.clone());
        if !skip_columns {
            clone.columns = self.columns.clone();
            clone.row_count = self.row_count;
            clone.version_tag = self.version_tag;
            clone.original_row_indexes = self.original_row_indexes.clone();
            clone.local_row_indexes = self.local_row_indexes.clone();
        }

        self.emit(&TableEvent::AfterCloneTable {
            table_id: self.id.clone(),
            skip_columns,
        });
        clone
    }

    // --- presentation slot ---

    /// Create the presentation (as a clone of this table) if absent.
    pub fn ensure_presentation(&mut self) {
        if self.presentation.is_none() {
            self.presentation = Some(Box::new(self.clone_table(false)));
        }
    }

    /// Replace the presentation's contents in place. Its subscribers stay
    /// attached; its row count becomes `original_row_indexes.len()`.
    pub fn write_presentation(&mut self, columns: Vec<(String, Column)>, original_row_indexes: Vec<usize>) {
        self.ensure_presentation();
        let Some(presentation) = self.presentation.as_deref_mut() else {
            return;
        };
        let slots = columns
            .into_iter()
            .map(|(id, data)| ColumnSlot {
                id,
                data: Arc::new(data),
            })
            .collect();
        presentation.replace_contents(slots, original_row_indexes);
    }

    /// Replace this table's columns and row maps with `other`'s, keeping
    /// this table's id, subscribers, and modifier. Columns are shared.
    pub fn assign_from(&mut self, other: &Table) {
        let original = (0..other.row_count)
            .map(|i| other.get_original_row_index(i).unwrap_or(i))
            .collect();
        self.replace_contents(other.columns.clone(), original);
    }

    fn replace_contents(&mut self, columns: Vec<ColumnSlot>, original_row_indexes: Vec<usize>) {
        let column_ids: Vec<String> = columns.iter().map(|s| s.id.clone()).collect();
        self.emit(&TableEvent::SetColumns {
            column_ids: column_ids.clone(),
            row_index: None,
        });

        self.columns = columns;
        self.row_count = original_row_indexes.len();
        self.normalize_lengths();
        self.set_original_row_indexes(original_row_indexes, false);
        self.touch();

        self.emit(&TableEvent::AfterSetColumns {
            column_ids,
            row_index: None,
        });
    }

    pub fn presentation_mut(&mut self) -> Option<&mut Table> {
        self.presentation.as_deref_mut()
    }

    pub fn take_presentation(&mut self) -> Option<Table> {
        self.presentation.take().map(|p| *p)
    }

    pub fn set_presentation(&mut self, presentation: Table) {
        self.presentation = Some(Box::new(presentation));
    }

    /// Consume the table, yielding its presentation (or itself when none).
    pub fn into_modified(mut self) -> Table {
        self.take_presentation().unwrap_or(self)
    }

    // --- helpers ---

    fn slot(&self, column_id: &str) -> Option<&ColumnSlot> {
        self.columns.iter().find(|s| s.id == column_id)
    }

    /// Writable column, detached from any clone sharing it. Missing columns
    /// are created at the current row count.
    fn column_mut(&mut self, column_id: &str) -> &mut Column {
        let pos = match self.columns.iter().position(|s| s.id == column_id) {
            Some(pos) => pos,
            None => {
                self.columns.push(ColumnSlot {
                    id: column_id.to_string(),
                    data: Arc::new(Column::Cells(vec![CellValue::Undefined; self.row_count])),
                });
                self.columns.len() - 1
            }
        };
        Arc::make_mut(&mut self.columns[pos].data)
    }

    fn replace_column(&mut self, column_id: String, data: Column) {
        match self.columns.iter_mut().find(|s| s.id == column_id) {
            Some(slot) => slot.data = Arc::new(data),
            None => self.columns.push(ColumnSlot {
                id: column_id,
                data: Arc::new(data),
            }),
        }
    }

    fn normalize_lengths(&mut self) {
        let row_count = self.row_count;
        for slot in &mut self.columns {
            if slot.data.len() != row_count {
                let col = Arc::make_mut(&mut slot.data);
                let taken = std::mem::take(col);
                *col = column::set_length(taken, row_count);
            }
        }
    }

    fn touch(&mut self) {
        self.version_tag = VersionTag::next();
    }

    fn rederive(&mut self) {
        if let Some(modifier) = self.modifier.clone() {
            if let Err(err) = modifier.modify(self) {
                tracing::warn!(table = %self.id, error = %err, "presentation not refreshed after mutation");
            }
        }
    }
}

/// Borrowed handle on one row, handed to filter predicates.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    /// Cell in `column_id`; `Undefined` if the column does not exist.
    pub fn get(&self, column_id: &str) -> CellValue {
        self.table
            .get_cell(column_id, self.index)
            .unwrap_or_default()
    }

    pub fn original_index(&self) -> Option<usize> {
        self.table.get_original_row_index(self.index)
    }

    pub fn to_object(&self) -> RowObject {
        self.table
            .get_columns()
            .map(|(id, col)| (id.to_string(), col.get(self.index).unwrap_or_default()))
            .collect()
    }
}

/// One past the last row a write of `count` rows at `start` touches, or
/// `None` when that index is not representable.
fn row_end(start: usize, count: usize) -> Option<usize> {
    let end = start.checked_add(count);
    if end.is_none() {
        tracing::warn!(start, count, "row index out of range; write ignored");
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn sample() -> Table {
        Table::with_id("t").with_columns([
            ("n", [5.0, 3.0, 1.0].into_iter().collect::<Column>()),
            ("s", ["a", "b", "c"].into_iter().collect::<Column>()),
        ])
    }

    #[test]
    fn overflowing_row_index_is_ignored() {
        let mut t = sample();
        let version = t.version_tag();
        t.set_cell("n", usize::MAX, CellValue::from(1));
        t.set_rows(vec![Row::Values(vec![CellValue::from(1)])], Some(usize::MAX), false);
        t.set_columns([("n", Column::numbers(vec![1.0, 2.0]))], Some(usize::MAX - 1));
        assert_eq!(t.get_row_count(), 3);
        assert_eq!(t.version_tag(), version);
        assert_eq!(t.get_cell("n", 0), Some(CellValue::from(5)));
    }

    #[test]
    fn columns_share_one_length() {
        let mut t = sample();
        t.set_column("long", [1, 2, 3, 4, 5].into_iter().collect());
        assert_eq!(t.get_row_count(), 5);
        assert_eq!(t.get_column("n").map(Column::len), Some(5));
        assert_eq!(t.get_cell("s", 4), Some(CellValue::Undefined));
        assert_eq!(t.get_cell("s", 5), None);
    }

    #[test]
    fn set_columns_at_row_index_writes_in_place() {
        let mut t = sample();
        t.set_columns([("n", Column::from(vec![CellValue::from(9)]))], Some(1));
        assert_eq!(t.get_cell("n", 1), Some(CellValue::from(9)));
        assert_eq!(t.get_cell("n", 0), Some(CellValue::from(5)));
        assert_eq!(t.get_row_count(), 3);
    }

    #[test]
    fn set_rows_overwrite_and_insert() {
        let mut t = sample();
        t.set_row(Row::Values(vec![CellValue::from(7), "z".into()]), Some(0), false);
        assert_eq!(t.get_row(0), Some(vec![CellValue::from(7), "z".into()]));
        assert_eq!(t.get_row_count(), 3);

        let mut obj = RowObject::new();
        obj.insert("n".into(), CellValue::from(8));
        obj.insert("extra".into(), true.into());
        t.set_row(Row::Object(obj), Some(1), true);
        assert_eq!(t.get_row_count(), 4);
        assert_eq!(t.get_cell("n", 1), Some(CellValue::from(8)));
        assert_eq!(t.get_cell("s", 1), Some(CellValue::Undefined));
        assert_eq!(t.get_cell("n", 2), Some(CellValue::from(3)));
        assert_eq!(t.get_cell("extra", 1), Some(true.into()));
        assert_eq!(t.get_cell("extra", 0), Some(CellValue::Undefined));
    }

    #[test]
    fn append_rows_by_default() {
        let mut t = sample();
        t.set_rows(vec![Row::Values(vec![CellValue::from(0)])], None, false);
        assert_eq!(t.get_row_count(), 4);
        assert_eq!(t.get_cell("n", 3), Some(CellValue::from(0)));
    }

    #[test]
    fn delete_rows_returns_removed_rows() {
        let mut t = sample();
        let removed = t.delete_rows(Some(1), 5);
        assert_eq!(removed, vec![vec![CellValue::from(3), "b".into()], vec![CellValue::from(1), "c".into()]]);
        assert_eq!(t.get_row_count(), 1);

        assert!(t.delete_rows(Some(10), 1).is_empty());
        assert_eq!(t.delete_rows(None, 0).len(), 1);
        assert_eq!(t.get_row_count(), 0);
    }

    #[test]
    fn set_cell_grows_table() {
        let mut t = sample();
        let before = t.version_tag();
        t.set_cell("new", 4, "x".into());
        assert_eq!(t.get_row_count(), 5);
        assert_eq!(t.get_cell("new", 4), Some("x".into()));
        assert_eq!(t.get_cell("n", 4), Some(CellValue::Undefined));
        assert_ne!(t.version_tag(), before);
    }

    #[test]
    fn clone_is_copy_on_write() {
        let t = sample();
        let mut c = t.clone_table(false);
        assert_eq!(c.version_tag(), t.version_tag());
        c.set_cell("n", 0, CellValue::from(100));
        assert_eq!(c.get_cell("n", 0), Some(CellValue::from(100)));
        assert_eq!(t.get_cell("n", 0), Some(CellValue::from(5)));
        assert_ne!(c.version_tag(), t.version_tag());

        let empty = t.clone_table(true);
        assert_eq!(empty.id(), "t");
        assert_eq!(empty.get_row_count(), 0);
    }

    #[test]
    fn row_index_maps_round_trip() {
        let mut t = sample();
        assert_eq!(t.get_original_row_index(2), Some(2));
        assert_eq!(t.get_local_row_index(7), Some(7));

        t.set_original_row_indexes(vec![2, 0], false);
        assert_eq!(t.get_original_row_index(0), Some(2));
        assert_eq!(t.get_original_row_index(5), None);
        assert_eq!(t.get_local_row_index(2), Some(0));
        assert_eq!(t.get_local_row_index(1), None);

        t.set_original_row_indexes(vec![2, 0], true);
        assert_eq!(t.get_local_row_index(0), Some(1));
    }

    #[test]
    fn get_modified_is_identity_without_modifier() {
        let t = sample();
        assert!(std::ptr::eq(t.get_modified(), &t));
    }

    #[test]
    fn write_presentation_keeps_subscribers() {
        let mut t = sample();
        t.ensure_presentation();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        t.get_modified().on_kind(TableEventKind::AfterSetColumns, move |e| {
            sink.lock().unwrap().push(e.clone());
        });

        t.write_presentation(vec![("n".into(), [1.0].into_iter().collect())], vec![2]);
        let p = t.get_modified();
        assert_eq!(p.get_row_count(), 1);
        assert_eq!(p.get_original_row_index(0), Some(2));
        assert_eq!(p.get_local_row_index(2), Some(0));
        assert_eq!(seen.lock().unwrap().len(), 1);
        // The source is untouched.
        assert_eq!(t.get_row_count(), 3);
    }

    #[test]
    fn mutation_events_fire_in_order() {
        let mut t = sample();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        t.on(move |e| sink.lock().unwrap().push(e.kind()));

        t.set_cell("n", 0, CellValue::from(1));
        t.delete_rows(Some(0), 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                TableEventKind::SetCell,
                TableEventKind::AfterSetCell,
                TableEventKind::DeleteRows,
                TableEventKind::AfterDeleteRows,
            ]
        );
    }

    #[test]
    fn delete_last_column_empties_table() {
        let mut t = sample();
        let removed = t.delete_columns(&["n", "s"]);
        assert_eq!(removed.len(), 2);
        assert_eq!(t.get_row_count(), 0);
    }

    #[test]
    fn row_lookup_by_value() {
        let t = sample();
        assert_eq!(t.get_row_index_by("s", &"c".into(), 0), Some(2));
        assert_eq!(t.get_row_index_by("s", &"a".into(), 1), None);
        assert_eq!(t.get_row_index_by("missing", &"a".into(), 0), None);
        let obj = t.get_row_object(1).unwrap();
        assert_eq!(obj.get("n"), Some(&CellValue::from(3)));
    }

    #[test]
    fn json_rows_fill_missing_keys() {
        let t = Table::from_json_rows(r#"[{"a": 1, "b": "x"}, {"a": 2, "c": true}]"#).unwrap();
        assert_eq!(t.get_column_ids().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(t.get_cell("b", 1), Some(CellValue::Undefined));
        assert_eq!(t.get_cell("c", 1), Some(CellValue::Bool(true)));
        assert!(matches!(
            Table::from_json_rows("{\"a\": 1}"),
            Err(crate::error::Error::Input(_))
        ));
    }
}
