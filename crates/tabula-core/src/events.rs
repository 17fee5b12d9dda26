//! Typed observers for tables and modifiers.
//!
//! Listeners run synchronously, in subscription order, on the thread that
//! emits. A listener must not subscribe or unsubscribe on the emitter that
//! is currently calling it.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::id::SubscriptionId;

type Listener<E> = Box<dyn FnMut(&E) + Send>;

pub struct EventEmitter<E> {
    listeners: Mutex<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener<E>)>> {
        // A listener that panicked leaves the list intact; keep serving it.
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe to every event; returns a handle for [`EventEmitter::off`].
    pub fn on<F>(&self, listener: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = SubscriptionId::next();
        self.lock().push((id, Box::new(listener)));
        id
    }

    /// Unsubscribe. Returns `false` if the handle was unknown.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(sid, _)| *sid != id);
        listeners.len() != before
    }

    pub fn emit(&self, event: &E) {
        for (_, listener) in self.lock().iter_mut() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableEventKind {
    CloneTable,
    AfterCloneTable,
    SetColumns,
    AfterSetColumns,
    DeleteColumns,
    AfterDeleteColumns,
    SetRows,
    AfterSetRows,
    DeleteRows,
    AfterDeleteRows,
    SetCell,
    AfterSetCell,
    Modify,
    AfterModify,
    Error,
}

/// Events a [`crate::Table`] emits around mutation and modification.
///
/// `Before`-style events fire prior to the change, `After*` once it is
/// visible through the table's read surface.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    CloneTable {
        table_id: String,
    },
    AfterCloneTable {
        table_id: String,
        skip_columns: bool,
    },
    SetColumns {
        column_ids: Vec<String>,
        row_index: Option<usize>,
    },
    AfterSetColumns {
        column_ids: Vec<String>,
        row_index: Option<usize>,
    },
    DeleteColumns {
        column_ids: Vec<String>,
    },
    AfterDeleteColumns {
        column_ids: Vec<String>,
    },
    SetRows {
        row_index: usize,
        row_count: usize,
        insert: bool,
    },
    AfterSetRows {
        row_index: usize,
        row_count: usize,
        insert: bool,
    },
    DeleteRows {
        row_index: usize,
        row_count: usize,
    },
    AfterDeleteRows {
        row_index: usize,
        row_count: usize,
    },
    SetCell {
        column_id: String,
        row_index: usize,
    },
    AfterSetCell {
        column_id: String,
        row_index: usize,
    },
    Modify {
        modifier: &'static str,
    },
    AfterModify {
        modifier: &'static str,
    },
    Error {
        modifier: &'static str,
        message: String,
    },
}

impl TableEvent {
    pub fn kind(&self) -> TableEventKind {
        match self {
            TableEvent::CloneTable { .. } => TableEventKind::CloneTable,
            TableEvent::AfterCloneTable { .. } => TableEventKind::AfterCloneTable,
            TableEvent::SetColumns { .. } => TableEventKind::SetColumns,
            TableEvent::AfterSetColumns { .. } => TableEventKind::AfterSetColumns,
            TableEvent::DeleteColumns { .. } => TableEventKind::DeleteColumns,
            TableEvent::AfterDeleteColumns { .. } => TableEventKind::AfterDeleteColumns,
            TableEvent::SetRows { .. } => TableEventKind::SetRows,
            TableEvent::AfterSetRows { .. } => TableEventKind::AfterSetRows,
            TableEvent::DeleteRows { .. } => TableEventKind::DeleteRows,
            TableEvent::AfterDeleteRows { .. } => TableEventKind::AfterDeleteRows,
            TableEvent::SetCell { .. } => TableEventKind::SetCell,
            TableEvent::AfterSetCell { .. } => TableEventKind::AfterSetCell,
            TableEvent::Modify { .. } => TableEventKind::Modify,
            TableEvent::AfterModify { .. } => TableEventKind::AfterModify,
            TableEvent::Error { .. } => TableEventKind::Error,
        }
    }
}

/// Events a modifier emits around each `modify` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierEvent {
    Modify { table_id: String },
    AfterModify { table_id: String },
    Error { table_id: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn subscribe_emit_unsubscribe() {
        let emitter: EventEmitter<u32> = EventEmitter::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        let id = emitter.on(move |v| {
            sink.fetch_add(*v as usize, Ordering::SeqCst);
        });

        emitter.emit(&3);
        emitter.emit(&4);
        assert_eq!(seen.load(Ordering::SeqCst), 7);

        assert!(emitter.off(id));
        assert!(!emitter.off(id));
        emitter.emit(&100);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn event_kinds() {
        let ev = TableEvent::AfterSetCell {
            column_id: "a".into(),
            row_index: 0,
        };
        assert_eq!(ev.kind(), TableEventKind::AfterSetCell);
    }
}
