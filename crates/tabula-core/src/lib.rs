#![forbid(unsafe_code)]
//! tabula-core: the in-memory columnar table behind a data grid.
//!
//! This crate owns the data model that every other crate builds on:
//! - `CellValue` and the `Column` storage primitives (length/splice/coercion),
//! - `Table` with its row-identity maps and presentation slot,
//! - the `Modifier` trait that derived-view transforms implement,
//! - typed observers (`EventEmitter`) for tables and modifiers.
//!
//! No transform lives here; see `tabula-modifiers` for sort/filter/range/chain.

pub mod cell;
pub mod column;
pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod modifier;
pub mod prelude;
pub mod table;

pub use cell::CellValue;
pub use column::{Column, ColumnView, Splice, SpliceView};
pub use error::{Error, Result};
pub use events::{EventEmitter, ModifierEvent, TableEvent, TableEventKind};
pub use modifier::{CallbackError, Modifier, ModifierError};
pub use table::{Row, RowObject, RowRef, Table};
