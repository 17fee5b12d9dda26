//! tabula: an in-memory columnar table with derived sorted, filtered, and
//! paginated views, the data layer behind a data grid.
//!
//! The work lives in the member crates; this crate re-exports them under one
//! name.

pub use tabula_core;
pub use tabula_modifiers;
pub use tabula_query;

pub use tabula_core::prelude::*;
pub use tabula_modifiers::{
    ChainModifier, Comparator, Condition, FilterModifier, Operator, RangeModifier, SortDirection,
    SortModifier,
};
pub use tabula_query::{
    FilteringController, PaginationController, QueryError, QueryState, QueryingController,
    SortingController,
};
