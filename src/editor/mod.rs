//! Cell editing state machine.
//!
//! `CellEditor` holds the editing state for one grid:
//! - at most one open [`EditSession`] (Idle / Editing)
//! - commits whose acknowledgement is still outstanding
//! - at most one activation queued behind such a commit
//!
//! It never touches the data source itself; `Grid` drives the transitions and
//! performs the reads/writes.

#[cfg(target_arch = "wasm32")]
pub(crate) mod input;

use crate::events::CellChange;
use crate::value::CellValue;

/// The open edit: the cell being edited and its draft.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub row: usize,
    pub column: String,
    /// Value shown in the cell while editing
    pub draft: CellValue,
    /// Committed value when the session opened
    pub original: CellValue,
}

impl EditSession {
    pub fn is_cell(&self, row: usize, column: &str) -> bool {
        self.row == row && self.column == column
    }
}

/// Identifies a commit awaiting the host's acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommitTicket(u32);

impl CommitTicket {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub fn from_u32(id: u32) -> Self {
        Self(id)
    }
}

/// A commit that was applied optimistically and not yet acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommit {
    pub ticket: CommitTicket,
    pub row: usize,
    pub column: String,
    pub value: CellValue,
    pub original: CellValue,
}

/// Result of `Grid::commit_edit` and `Grid::settle_commit`.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Nothing was being edited.
    NoSession,
    /// Written and acknowledged; a change event was dispatched.
    Committed(CellChange),
    /// Written optimistically; the acknowledgement is outstanding.
    Pending {
        ticket: CommitTicket,
        change: CellChange,
    },
    /// The write failed; the original value is shown again and no event fired.
    Reverted { change: CellChange, reason: String },
}

impl CommitOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitOutcome::Committed(_))
    }
}

/// What `Grid::begin_edit` did with the requested cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    /// A new session is open on the cell.
    Started,
    /// The cell was already being edited.
    AlreadyEditing,
    /// A commit for this cell is in flight; the session opens once it settles.
    Queued,
    /// The cell is outside the materialized window.
    NotVisible,
}

/// Result of `Grid::begin_edit`.
#[derive(Debug, Clone, PartialEq)]
pub struct BeginEdit {
    /// Outcome of committing the previously open session, if there was one.
    pub previous: Option<CommitOutcome>,
    pub status: EditStatus,
}

/// Editing state for one grid.
#[derive(Debug, Default)]
pub struct CellEditor {
    session: Option<EditSession>,
    pending: Vec<PendingCommit>,
    queued: Option<(usize, String)>,
    next_ticket: u32,
}

impl CellEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_editing_cell(&self, row: usize, column: &str) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_cell(row, column))
    }

    /// Idle → Editing. Replaces any queued activation.
    pub fn open(&mut self, row: usize, column: &str, original: CellValue) {
        tracing::debug!(row, column, "edit session opened");
        self.queued = None;
        self.session = Some(EditSession {
            row,
            column: column.to_string(),
            draft: original.clone(),
            original,
        });
    }

    /// Editing → Editing with a new draft. `false` when Idle.
    pub fn set_draft(&mut self, value: CellValue) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.draft = value;
                true
            }
            None => false,
        }
    }

    /// Editing → Idle, handing the session to the commit path.
    pub fn take_session(&mut self) -> Option<EditSession> {
        self.session.take()
    }

    /// Editing → Idle, discarding the draft.
    pub fn cancel(&mut self) -> Option<EditSession> {
        let session = self.session.take();
        if let Some(s) = &session {
            tracing::debug!(row = s.row, column = %s.column, "edit session cancelled");
        }
        session
    }

    /// Record an optimistic write awaiting acknowledgement.
    pub fn track_pending(&mut self, session: EditSession) -> CommitTicket {
        let ticket = CommitTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.pending.push(PendingCommit {
            ticket,
            row: session.row,
            column: session.column,
            value: session.draft,
            original: session.original,
        });
        ticket
    }

    /// Remove and return the pending commit for `ticket`.
    pub fn resolve(&mut self, ticket: CommitTicket) -> Option<PendingCommit> {
        let idx = self.pending.iter().position(|p| p.ticket == ticket)?;
        Some(self.pending.remove(idx))
    }

    pub fn is_pending(&self, row: usize, column: &str) -> bool {
        self.pending
            .iter()
            .any(|p| p.row == row && p.column == column)
    }

    pub fn pending(&self) -> &[PendingCommit] {
        &self.pending
    }

    /// Queue an activation behind an in-flight commit.
    pub fn queue(&mut self, row: usize, column: &str) {
        self.queued = Some((row, column.to_string()));
    }

    pub fn queued(&self) -> Option<(usize, &str)> {
        self.queued.as_ref().map(|(r, c)| (*r, c.as_str()))
    }

    /// Take the queued activation if it targets `(row, column)` and no other
    /// commit for that cell is still outstanding.
    pub fn take_queued_for(&mut self, row: usize, column: &str) -> bool {
        let matches = self
            .queued
            .as_ref()
            .is_some_and(|(r, c)| *r == row && c == column);
        if matches && !self.is_pending(row, column) {
            self.queued = None;
            true
        } else {
            false
        }
    }

    pub fn clear_queued(&mut self) {
        self.queued = None;
    }

    /// Forget everything (dispose / data source replaced).
    pub fn reset(&mut self) {
        self.session = None;
        self.pending.clear();
        self.queued = None;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_editing_idle() {
        let mut editor = CellEditor::new();
        assert!(!editor.is_editing());
        assert!(!editor.set_draft(CellValue::from("x")));

        editor.open(3, "B", CellValue::from("old"));
        assert!(editor.is_editing_cell(3, "B"));
        assert!(editor.set_draft(CellValue::from("new")));
        assert_eq!(editor.session().unwrap().draft, CellValue::from("new"));
        assert_eq!(editor.session().unwrap().original, CellValue::from("old"));

        let session = editor.take_session().unwrap();
        assert_eq!(session.draft, CellValue::from("new"));
        assert!(!editor.is_editing());
        assert!(editor.cancel().is_none());
    }

    #[test]
    fn test_pending_and_queue() {
        let mut editor = CellEditor::new();
        editor.open(1, "A", CellValue::Empty);
        editor.set_draft(CellValue::Number(5.0));
        let session = editor.take_session().unwrap();
        let ticket = editor.track_pending(session);
        assert!(editor.is_pending(1, "A"));

        editor.queue(1, "A");
        assert!(!editor.take_queued_for(1, "A"), "still in flight");

        let pending = editor.resolve(ticket).unwrap();
        assert_eq!(pending.value, CellValue::Number(5.0));
        assert!(editor.resolve(ticket).is_none());
        assert!(editor.take_queued_for(1, "A"));
        assert_eq!(editor.queued(), None);
    }

    #[test]
    fn test_open_clears_queue() {
        let mut editor = CellEditor::new();
        editor.queue(2, "C");
        editor.open(0, "A", CellValue::Empty);
        assert_eq!(editor.queued(), None);
    }
}
