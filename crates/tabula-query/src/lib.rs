#![forbid(unsafe_code)]
//! tabula-query: controllers that turn user-facing sort/filter/page options
//! into modifiers, and the orchestrator that runs them.
//!
//! One recompute pass clones the source table, runs `[sort, filter]` as a
//! chain, applies the page window over the filtered row count, and keeps
//! the result as the presentation table. Passes only run when an option
//! changed or the source table's version tag moved.

pub mod error;
pub mod filtering;
pub mod metrics;
pub mod pagination;
pub mod querying;
pub mod sorting;
pub mod state;

pub use error::QueryError;
pub use filtering::{ColumnFilterState, FilteringController};
pub use pagination::{PaginationController, PaginationState};
pub use querying::QueryingController;
pub use sorting::{SortingController, SortingState};
pub use state::QueryState;
