//! Filter modifier: keep the rows a [`Condition`] accepts.

pub mod condition;

use std::fmt;

use tabula_core::prelude::*;

use crate::present::present_rows;
use condition::{Condition, Predicate};

pub struct FilterModifier {
    condition: Option<Condition>,
    // Compiled once at construction.
    predicate: Option<Predicate>,
    events: EventEmitter<ModifierEvent>,
}

impl fmt::Debug for FilterModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterModifier")
            .field("condition", &self.condition)
            .finish()
    }
}

impl FilterModifier {
    pub fn new(condition: Condition) -> Self {
        let predicate = condition.compile();
        Self {
            condition: Some(condition),
            predicate: Some(predicate),
            events: EventEmitter::new(),
        }
    }

    /// A filter without a condition; every row passes through unchanged.
    pub fn pass_through() -> Self {
        Self {
            condition: None,
            predicate: None,
            events: EventEmitter::new(),
        }
    }

    pub fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }
}

impl Modifier for FilterModifier {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn events(&self) -> &EventEmitter<ModifierEvent> {
        &self.events
    }

    fn modify_table(&self, table: &mut Table) -> Result<(), ModifierError> {
        let rows_in = table.get_row_count();
        let keep: Vec<usize> = match &self.predicate {
            None => (0..rows_in).collect(),
            Some(predicate) => {
                let mut keep = Vec::new();
                for row in table.rows() {
                    let accepted = predicate(&row).map_err(|source| ModifierError::Callback {
                        modifier: self.name(),
                        source,
                    })?;
                    if accepted {
                        keep.push(row.index());
                    }
                }
                keep
            }
        };
        present_rows(table, &keep);

        tracing::trace!(rows_in, rows_out = keep.len(), "filtered rows");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condition::Operator;
    use std::sync::{Arc, Mutex};

    fn table() -> Table {
        Table::with_id("t").with_columns([
            ("n", [5.0, 3.0, 1.0, 4.0, 2.0].into_iter().collect::<Column>()),
        ])
    }

    fn values(table: &Table) -> Vec<CellValue> {
        table.get_column("n").map(Column::to_cells).unwrap_or_default()
    }

    #[test]
    fn keeps_matching_rows_with_original_indexes() {
        let mut t = table();
        FilterModifier::new(Condition::leaf("n", Operator::Gt, 2))
            .modify(&mut t)
            .unwrap();
        let p = t.get_modified();
        assert_eq!(
            values(p),
            vec![CellValue::from(5), CellValue::from(3), CellValue::from(4)]
        );
        assert_eq!(p.original_row_indexes(), Some(&[0, 1, 3][..]));
        assert_eq!(p.get_local_row_index(3), Some(2));
        assert_eq!(p.get_local_row_index(2), None);
    }

    #[test]
    fn numeric_strings_compare_as_numbers() {
        let mut t = Table::with_id("s").with_columns([(
            "n",
            Column::cells(vec!["9".into(), "10".into(), "12".into(), "pear".into()]),
        )]);
        FilterModifier::new(Condition::leaf("n", Operator::Gt, "9"))
            .modify(&mut t)
            .unwrap();
        // Text that is not a number still compares as text, so it sorts last.
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[1, 2, 3][..]));

        FilterModifier::new(Condition::leaf("n", Operator::Le, "10"))
            .modify(&mut t)
            .unwrap();
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[0, 1][..]));

        FilterModifier::new(Condition::leaf("n", Operator::Gt, "apple"))
            .modify(&mut t)
            .unwrap();
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[3][..]));
    }

    #[test]
    fn pass_through_without_condition() {
        let mut t = table();
        FilterModifier::pass_through().modify(&mut t).unwrap();
        assert_eq!(values(t.get_modified()), values(&t));
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[0, 1, 2, 3, 4][..]));
    }

    #[test]
    fn predicate_failure_emits_error_and_keeps_presentation() {
        let mut t = table();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        t.on_kind(TableEventKind::Error, move |e| sink.lock().unwrap().push(e.clone()));

        let failing = FilterModifier::new(Condition::custom(|row| {
            if row.index() == 2 {
                Err(CallbackError::new("cannot read row"))
            } else {
                Ok(true)
            }
        }));
        let modifier_errors = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&modifier_errors);
        failing.events().on(move |e| {
            if matches!(e, ModifierEvent::Error { .. }) {
                *counter.lock().unwrap() += 1;
            }
        });

        let err = failing.modify(&mut t).unwrap_err();
        assert!(err.to_string().contains("cannot read row"));
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(*modifier_errors.lock().unwrap(), 1);
        // The presentation created by `modify` still mirrors the source.
        assert_eq!(t.get_modified().get_row_count(), 5);
    }

    #[test]
    fn attached_filter_follows_source_mutations() {
        let mut t = table();
        t.set_modifier(Some(Arc::new(FilterModifier::new(Condition::leaf(
            "n",
            Operator::Ge,
            4,
        )))))
        .unwrap();
        assert_eq!(t.get_modified().get_row_count(), 2);

        t.set_cell("n", 2, CellValue::from(10));
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[0, 2, 3][..]));

        t.set_modifier(None).unwrap();
        assert!(std::ptr::eq(t.get_modified(), &t));
    }
}
