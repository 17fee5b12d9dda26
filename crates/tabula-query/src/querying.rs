//! Querying controller: runs sorting, filtering, and pagination as one pass.
//!
//! Pass order is fixed: `[sort, filter]` as a chain, then the page window
//! over the filtered row count. Filtering after sorting keeps the sorted
//! order because filtering only removes rows.

use std::sync::Arc;
use std::time::Instant;

use tabula_core::prelude::*;
use tabula_modifiers::ChainModifier;

use crate::error::QueryError;
use crate::filtering::FilteringController;
use crate::metrics::emit_span;
use crate::pagination::PaginationController;
use crate::sorting::SortingController;
use crate::state::QueryState;

#[derive(Debug, Default)]
pub struct QueryingController {
    sorting: SortingController,
    filtering: FilteringController,
    pagination: PaginationController,
    should_be_updated: bool,
    /// Source table id and version the presentation was derived from.
    derived_from: Option<(String, VersionTag)>,
    presentation: Option<Table>,
}

impl QueryingController {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            filtering: FilteringController::with_config(config),
            pagination: PaginationController::with_config(config),
            ..Self::default()
        }
    }

    pub fn sorting(&self) -> &SortingController {
        &self.sorting
    }

    pub fn sorting_mut(&mut self) -> &mut SortingController {
        &mut self.sorting
    }

    pub fn filtering(&self) -> &FilteringController {
        &self.filtering
    }

    pub fn filtering_mut(&mut self) -> &mut FilteringController {
        &mut self.filtering
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn pagination_mut(&mut self) -> &mut PaginationController {
        &mut self.pagination
    }

    /// Force the next `proceed` to recompute.
    pub fn mark_for_update(&mut self) {
        self.should_be_updated = true;
    }

    /// True when any option changed since the last pass.
    pub fn should_be_updated(&self) -> bool {
        self.should_be_updated
            || self.sorting.is_dirty()
            || self.filtering.is_dirty()
            || self.pagination.is_dirty()
    }

    /// The last computed presentation table.
    pub fn presentation(&self) -> Option<&Table> {
        self.presentation.as_ref()
    }

    /// Recompute the presentation of `source` if forced, if options changed,
    /// or if `source` was mutated since the last pass. Returns whether a pass
    /// ran.
    pub fn proceed(&mut self, source: &Table, force: bool) -> Result<bool, QueryError> {
        let source_moved = self
            .derived_from
            .as_ref()
            .map_or(true, |(id, version)| id != source.id() || *version != source.version_tag());
        if !(force || source_moved || self.should_be_updated()) {
            return Ok(false);
        }
        self.modify_data(source)?;
        Ok(true)
    }

    #[cfg(feature = "async")]
    /// Await a recompute pass. The pass itself is synchronous; this only lets
    /// the runtime schedule other work first.
    pub async fn proceed_async(&mut self, source: &Table, force: bool) -> Result<bool, QueryError> {
        tokio::task::yield_now().await;
        self.proceed(source, force)
    }

    /// Run one pass over a clone of `source`; `source` itself is never
    /// modified. On failure the previous presentation is kept and the pass
    /// stays pending.
    pub fn modify_data(&mut self, source: &Table) -> Result<(), QueryError> {
        let started = Instant::now();
        let options_changed = self.should_be_updated();

        let mut working = source.clone_table(false);
        let mut steps: Vec<Arc<dyn Modifier>> = Vec::with_capacity(2);
        if let Some(sort) = self.sorting.modifier() {
            steps.push(Arc::new(sort));
        }
        if let Some(filter) = self.filtering.modifier() {
            steps.push(Arc::new(filter));
        }
        if !steps.is_empty() {
            ChainModifier::new(steps).modify(&mut working)?;
            working = working.into_modified();
        }

        let filtered_rows = working.get_row_count();
        if let Some(range) = self.pagination.create_modifier(filtered_rows) {
            range.modify(&mut working)?;
            working = working.into_modified();
        }

        // New options produce a new presentation; source-only changes refill
        // the existing one so its subscribers see the update.
        match &mut self.presentation {
            Some(presentation) if !options_changed => presentation.assign_from(&working),
            slot => *slot = Some(working),
        }

        self.sorting.mark_clean();
        self.filtering.mark_clean();
        self.pagination.mark_clean();
        self.should_be_updated = false;
        self.derived_from = Some((source.id().to_string(), source.version_tag()));

        let visible = self.presentation.as_ref().map_or(0, Table::get_row_count);
        let elapsed_us = started.elapsed().as_micros();
        emit_span(
            "query_recompute",
            &[
                ("rows_in", source.get_row_count().to_string()),
                ("rows_filtered", filtered_rows.to_string()),
                ("rows_visible", visible.to_string()),
                ("elapsed_us", elapsed_us.to_string()),
            ],
        );
        tracing::debug!(
            table = %source.id(),
            rows_in = source.get_row_count(),
            rows_filtered = filtered_rows,
            rows_visible = visible,
            elapsed_us = elapsed_us as u64,
            "recomputed presentation"
        );
        Ok(())
    }

    /// Snapshot every controller's options.
    pub fn state(&self) -> QueryState {
        QueryState {
            sorting: self.sorting.state(),
            filtering: self.filtering.state(),
            pagination: self.pagination.state(),
        }
    }

    /// Apply a snapshot. Invalid filters and extra sorted columns are dropped
    /// with a warning; returns the number of dropped filters.
    pub fn load_state(&mut self, state: &QueryState) -> usize {
        self.sorting.load(&state.sorting);
        let dropped = self.filtering.load(&state.filtering);
        self.pagination.load(&state.pagination);
        dropped
    }
}
