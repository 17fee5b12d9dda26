#![forbid(unsafe_code)]
//! tabula-modifiers: transforms that derive a table's presentation.
//!
//! Design intent:
//! - Every modifier is pure and synchronous; async lives only at the
//!   orchestration boundary in `tabula-query`.
//! - A modifier reads the source columns of the table it is applied to and
//!   writes a fresh row set into that table's presentation, mapping each
//!   output row back to the ultimate source row.
//! - Results are built in scratch buffers; a failed transform leaves the
//!   previous presentation as it was.

pub mod chain;
pub mod filter;
pub mod range;
pub mod sort;

mod present;

pub use chain::ChainModifier;
pub use filter::condition::{Condition, ConditionError, Operator, Predicate};
pub use filter::FilterModifier;
pub use range::RangeModifier;
pub use sort::{Comparator, SortDirection, SortModifier};

pub use tabula_core::modifier::{CallbackError, Modifier, ModifierError};
