//! Range modifier: a contiguous window of rows, used for pagination.

use tabula_core::prelude::*;

use crate::present::present_rows;

#[derive(Debug, Default)]
pub struct RangeModifier {
    /// Inclusive.
    start: usize,
    /// Exclusive; clamped to the row count when applied.
    end: usize,
    events: EventEmitter<ModifierEvent>,
}

impl RangeModifier {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            events: EventEmitter::new(),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }
}

impl Modifier for RangeModifier {
    fn name(&self) -> &'static str {
        "range"
    }

    fn events(&self) -> &EventEmitter<ModifierEvent> {
        &self.events
    }

    fn modify_table(&self, table: &mut Table) -> Result<(), ModifierError> {
        let row_count = table.get_row_count();
        let end = self.end.min(row_count);
        let start = self.start.min(end);
        let rows: Vec<usize> = (start..end).collect();
        present_rows(table, &rows);

        tracing::trace!(start, end, row_count, "applied row range");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::with_id("t").with_columns([("n", (0..10).collect::<Column>())])
    }

    #[test]
    fn window_with_clamped_end() {
        let mut t = table();
        RangeModifier::new(8, 20).modify(&mut t).unwrap();
        let p = t.get_modified();
        assert_eq!(p.get_row_count(), 2);
        assert_eq!(p.original_row_indexes(), Some(&[8, 9][..]));
        assert_eq!(p.get_cell("n", 0), Some(CellValue::from(8)));
    }

    #[test]
    fn start_past_end_is_empty() {
        let mut t = table();
        RangeModifier::new(12, 15).modify(&mut t).unwrap();
        assert_eq!(t.get_modified().get_row_count(), 0);
        assert!(t.get_modified().has_column("n"));
    }

    #[test]
    fn keeps_upstream_original_indexes() {
        let mut t = table();
        t.set_original_row_indexes(vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0], false);
        RangeModifier::new(1, 3).modify(&mut t).unwrap();
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[8, 7][..]));
    }
}
