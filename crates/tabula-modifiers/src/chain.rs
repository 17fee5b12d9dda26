//! Chain modifier: run several modifiers one after another.
//!
//! Each step reads the previous step's presentation. The steps run on a
//! staging clone of the table; the table's presentation is replaced only
//! after every step has succeeded.

use std::fmt;
use std::sync::Arc;

use tabula_core::prelude::*;

#[derive(Default)]
pub struct ChainModifier {
    modifiers: Vec<Arc<dyn Modifier>>,
    reverse: bool,
    events: EventEmitter<ModifierEvent>,
}

impl fmt::Debug for ChainModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainModifier")
            .field("steps", &self.step_names())
            .field("reverse", &self.reverse)
            .finish()
    }
}

impl ChainModifier {
    pub fn new(modifiers: Vec<Arc<dyn Modifier>>) -> Self {
        Self {
            modifiers,
            ..Self::default()
        }
    }

    /// Run the steps last-to-first.
    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn add(&mut self, modifier: Arc<dyn Modifier>) {
        self.modifiers.push(modifier);
    }

    /// Remove a step by identity. Returns `false` if it was not in the chain.
    pub fn remove(&mut self, modifier: &Arc<dyn Modifier>) -> bool {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| !Arc::ptr_eq(m, modifier));
        self.modifiers.len() != before
    }

    pub fn clear(&mut self) {
        self.modifiers.clear();
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps().map(|m| m.name()).collect()
    }

    fn steps(&self) -> Box<dyn Iterator<Item = &Arc<dyn Modifier>> + '_> {
        if self.reverse {
            Box::new(self.modifiers.iter().rev())
        } else {
            Box::new(self.modifiers.iter())
        }
    }
}

impl Modifier for ChainModifier {
    fn name(&self) -> &'static str {
        "chain"
    }

    fn events(&self) -> &EventEmitter<ModifierEvent> {
        &self.events
    }

    fn modify_table(&self, table: &mut Table) -> Result<(), ModifierError> {
        let mut stage = table.clone_table(false);
        for (step, modifier) in self.steps().enumerate() {
            modifier
                .modify(&mut stage)
                .map_err(|source| ModifierError::Chain {
                    step,
                    modifier: modifier.name(),
                    source: Box::new(source),
                })?;
            stage = stage.into_modified();
        }

        tracing::trace!(steps = self.len(), rows = stage.get_row_count(), "chain finished");
        match table.presentation_mut() {
            // Refill the existing presentation so its subscribers stay attached.
            Some(presentation) => presentation.assign_from(&stage),
            None => table.set_presentation(stage),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, FilterModifier, Operator, RangeModifier, SortDirection, SortModifier};
    use std::sync::Mutex;

    fn table() -> Table {
        Table::with_id("t").with_columns([(
            "n",
            [5.0, 3.0, 1.0, 4.0, 2.0].into_iter().collect::<Column>(),
        )])
    }

    fn sort_then_filter() -> ChainModifier {
        ChainModifier::new(vec![
            Arc::new(SortModifier::new("n", SortDirection::Asc)),
            Arc::new(FilterModifier::new(Condition::leaf("n", Operator::Gt, 2))),
        ])
    }

    #[test]
    fn steps_compose_and_keep_source_indexes() {
        let mut t = table();
        sort_then_filter().modify(&mut t).unwrap();
        let p = t.get_modified();
        assert_eq!(
            p.get_column("n").map(Column::to_cells),
            Some(vec![CellValue::from(3), CellValue::from(4), CellValue::from(5)])
        );
        assert_eq!(p.original_row_indexes(), Some(&[1, 3, 0][..]));
        assert_eq!(t.get_row_count(), 5);
    }

    #[test]
    fn reversed_chain_runs_last_step_first() {
        let mut t = table();
        let chain = ChainModifier::new(vec![
            Arc::new(SortModifier::new("n", SortDirection::Desc)),
            Arc::new(RangeModifier::new(0, 2)),
        ])
        .reversed(true);
        assert_eq!(chain.step_names(), vec!["range", "sort"]);
        chain.modify(&mut t).unwrap();
        // Range [5, 3], then sorted descending.
        assert_eq!(t.get_modified().original_row_indexes(), Some(&[0, 1][..]));
    }

    #[test]
    fn failing_step_aborts_and_keeps_presentation() {
        let mut t = table();
        sort_then_filter().modify(&mut t).unwrap();
        let before = t.get_modified().original_row_indexes().map(<[usize]>::to_vec);

        let mut chain = sort_then_filter();
        chain.add(Arc::new(FilterModifier::new(Condition::custom(|_| {
            Err(CallbackError::new("nope"))
        }))));
        let err = chain.modify(&mut t).unwrap_err();
        assert!(matches!(err, ModifierError::Chain { step: 2, modifier: "filter", .. }));
        assert_eq!(t.get_modified().original_row_indexes().map(<[usize]>::to_vec), before);
    }

    #[test]
    fn presentation_subscribers_survive_reruns() {
        let mut t = table();
        let chain = sort_then_filter();
        chain.modify(&mut t).unwrap();

        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        t.get_modified()
            .on_kind(TableEventKind::AfterSetColumns, move |_| *sink.lock().unwrap() += 1);
        chain.modify(&mut t).unwrap();
        assert_eq!(*hits.lock().unwrap(), 1);
    }

    #[test]
    fn add_remove_clear() {
        let sort: Arc<dyn Modifier> = Arc::new(SortModifier::new("n", SortDirection::Asc));
        let mut chain = ChainModifier::default();
        chain.add(Arc::clone(&sort));
        chain.add(Arc::new(RangeModifier::new(0, 1)));
        assert_eq!(chain.len(), 2);
        assert!(chain.remove(&sort));
        assert!(!chain.remove(&sort));
        chain.clear();
        assert!(chain.is_empty());

        let mut t = table();
        chain.modify(&mut t).unwrap();
        assert_eq!(t.get_modified().get_row_count(), 5);
    }
}
