//! Convenient re-exports for downstream crates.

pub use crate::cell::CellValue;
pub use crate::column::{convert_to_number, convert_to_number_or_nan, Column, ColumnView};
pub use crate::config::GridConfig;
pub use crate::error::{Error, Result};
pub use crate::events::{EventEmitter, ModifierEvent, TableEvent, TableEventKind};
pub use crate::id::{SubscriptionId, VersionTag};
pub use crate::modifier::{CallbackError, Modifier, ModifierError};
pub use crate::table::{Row, RowObject, RowRef, Table};
