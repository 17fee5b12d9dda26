//! The `Modifier` interface: a transform from a table into its presentation.
//!
//! Concrete modifiers live in `tabula-modifiers`. Only the trait lives here, so
//! `Table` can hold an attached modifier and re-derive its presentation after
//! every mutation without depending on the transform implementations.

use thiserror::Error;

use crate::events::{EventEmitter, ModifierEvent, TableEvent};
use crate::table::Table;

/// Failure reported by a user-supplied comparator or predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, Error)]
pub enum ModifierError {
    #[error("{modifier}: user callback failed: {source}")]
    Callback {
        modifier: &'static str,
        #[source]
        source: CallbackError,
    },

    #[error("chain step {step} ({modifier}) failed: {source}")]
    Chain {
        step: usize,
        modifier: &'static str,
        #[source]
        source: Box<ModifierError>,
    },

    #[error("invalid modifier options: {0}")]
    Invalid(String),
}

/// Trait that all table modifiers implement.
///
/// Invariants:
/// - `modify_table` writes its result into `table.get_modified()` (the
///   presentation slot) and never replaces the source columns.
/// - Results are built in scratch buffers and swapped in only on success, so
///   a failing modifier leaves the previous presentation untouched.
/// - Re-applying a modifier with unchanged options yields the same
///   presentation (rows, order, original row indexes).
pub trait Modifier: Send + Sync {
    /// Human-readable modifier name (stable).
    fn name(&self) -> &'static str;

    /// Observer for this modifier's `Modify`/`AfterModify`/`Error` events.
    fn events(&self) -> &EventEmitter<ModifierEvent>;

    /// Core synchronous transform; writes into the presentation of `table`.
    fn modify_table(&self, table: &mut Table) -> Result<(), ModifierError>;

    /// Ensure `table` has a presentation, run [`Modifier::modify_table`], and
    /// report the outcome through both the table's and the modifier's events.
    fn modify(&self, table: &mut Table) -> Result<(), ModifierError> {
        let name = self.name();
        let table_id = table.id().to_string();

        table.emit(&TableEvent::Modify { modifier: name });
        self.events().emit(&ModifierEvent::Modify {
            table_id: table_id.clone(),
        });

        table.ensure_presentation();
        match self.modify_table(table) {
            Ok(()) => {
                table.emit(&TableEvent::AfterModify { modifier: name });
                self.events().emit(&ModifierEvent::AfterModify { table_id });
                Ok(())
            }
            Err(err) => {
                tracing::error!(modifier = name, table = %table_id, error = %err, "modifier failed");
                let message = err.to_string();
                table.emit(&TableEvent::Error {
                    modifier: name,
                    message: message.clone(),
                });
                self.events()
                    .emit(&ModifierEvent::Error { table_id, message });
                Err(err)
            }
        }
    }
}
