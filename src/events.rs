//! Cell-change notifications.
//!
//! One notification type, [`CellChange`], delivered synchronously to every
//! registered listener in registration order. A listener that fails is logged
//! and skipped; later listeners still run and the grid state is untouched.

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Payload of a "cell changed" notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellChange {
    /// Row index in the data source
    pub row: usize,
    /// Column key
    pub column: String,
    /// Newly committed value
    pub value: CellValue,
}

/// Error returned by a listener. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

/// Handle returned by [`ChangeDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u32);

impl ListenerId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }
}

pub type Listener = Box<dyn FnMut(&CellChange) -> Result<(), ListenerError>>;

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered listener registry.
#[derive(Default)]
pub struct ChangeDispatcher {
    listeners: Vec<(ListenerId, Listener)>,
    next_id: u32,
}

impl std::fmt::Debug for ChangeDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ChangeDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CellChange) -> Result<(), ListenerError> + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Deliver `change` to every listener in registration order.
    pub fn dispatch(&mut self, change: &CellChange) -> DispatchReport {
        let mut report = DispatchReport::default();
        for (id, listener) in &mut self.listeners {
            match listener(change) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    tracing::warn!(
                        listener = id.0,
                        row = change.row,
                        column = %change.column,
                        "cell change listener failed: {err}"
                    );
                }
            }
        }
        report
    }
}
