//! The grid engine.
//!
//! `Grid` coordinates the pieces:
//! - builds the layout from the data source and configuration
//! - re-virtualizes on scroll, resize, size changes and data changes
//! - materializes the window onto a [`CellSurface`]
//! - drives the editing state machine and dispatches change events
//!
//! Every public operation runs to completion synchronously. The only deferred
//! step is a write the data source acknowledged with [`WriteAck::Deferred`],
//! which the host resolves later with [`Grid::settle_commit`].

use std::collections::HashSet;
use std::rc::Rc;

use crate::config::GridConfig;
use crate::editor::{BeginEdit, CellEditor, CommitOutcome, CommitTicket, EditSession, EditStatus};
use crate::error::{GridError, Result};
use crate::events::{CellChange, ChangeDispatcher, ListenerError, ListenerId};
use crate::layout::{check_size, ColumnSet, GridLayout, Viewport};
use crate::resize::ResizeBridge;
use crate::source::{SharedSource, WriteAck};
use crate::surface::{CellSurface, CellView};
use crate::value::CellValue;
use crate::virtualizer::{CellWindow, Virtualizer};

/// Virtualized, editable grid over a shared data source.
pub struct Grid<S: CellSurface> {
    source: Option<SharedSource>,
    config: GridConfig,
    columns: ColumnSet,
    layout: GridLayout,
    viewport: Viewport,
    virtualizer: Virtualizer,
    window: Option<CellWindow>,
    mounted: HashSet<(usize, String)>,
    editor: CellEditor,
    dispatcher: ChangeDispatcher,
    resize: ResizeBridge,
    surface: S,
}

impl<S: CellSurface> Grid<S> {
    /// Build a grid. Nothing is materialized until the viewport has a size
    /// (see [`Grid::observe_size`]).
    pub fn new(source: SharedSource, config: GridConfig, surface: S) -> Result<Self> {
        config.validate()?;
        let (row_count, keys) = {
            let src = source.borrow();
            (src.row_count(), src.column_keys())
        };
        let columns = ColumnSet::new(
            &keys,
            config.default_column_width,
            config.min_column_width,
            &config.column_widths,
        );
        let layout = GridLayout::new(
            row_count,
            config.default_row_height,
            &config.row_heights,
            &columns,
            config.default_column_width,
        );
        tracing::debug!(rows = row_count, columns = columns.len(), "grid created");

        Ok(Self {
            source: Some(source),
            virtualizer: Virtualizer::new(config.overscan),
            config,
            columns,
            layout,
            viewport: Viewport::default(),
            window: None,
            mounted: HashSet::new(),
            editor: CellEditor::new(),
            dispatcher: ChangeDispatcher::new(),
            resize: ResizeBridge::new(0.0, 0.0),
            surface,
        })
    }

    // ---- Accessors ----

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Window materialized by the last render pass.
    pub fn window(&self) -> Option<CellWindow> {
        self.window
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_disposed(&self) -> bool {
        self.source.is_none()
    }

    pub fn data_source(&self) -> Option<&SharedSource> {
        self.source.as_ref()
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.editor.session()
    }

    pub fn is_editing(&self) -> bool {
        self.editor.is_editing()
    }

    /// `(row, column)` of the open edit session.
    pub fn editing_cell(&self) -> Option<(usize, &str)> {
        self.editor.session().map(|s| (s.row, s.column.as_str()))
    }

    pub fn draft(&self) -> Option<&CellValue> {
        self.editor.session().map(|s| &s.draft)
    }

    /// Number of commits awaiting acknowledgement.
    pub fn pending_commits(&self) -> usize {
        self.editor.pending().len()
    }

    fn shared_source(&self) -> Result<SharedSource> {
        self.source.as_ref().map(Rc::clone).ok_or(GridError::Disposed)
    }

    // ---- Listeners ----

    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CellChange) -> std::result::Result<(), ListenerError> + 'static,
    {
        self.dispatcher.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    // ---- Viewport ----

    /// Scroll to an absolute position (clamped) and re-virtualize.
    pub fn scroll_to(&mut self, x: f64, y: f64) -> Result<Option<CellWindow>> {
        self.shared_source()?;
        self.viewport.set_scroll(x, y, &self.layout);
        self.render()?;
        Ok(self.window)
    }

    /// Scroll by a delta (clamped) and re-virtualize.
    pub fn scroll_by(&mut self, dx: f64, dy: f64) -> Result<Option<CellWindow>> {
        self.shared_source()?;
        self.viewport.scroll_by(dx, dy, &self.layout);
        self.render()?;
        Ok(self.window)
    }

    /// Feed a container measurement. Re-virtualizes only when the size
    /// actually changed; bad measurements are logged and ignored.
    pub fn observe_size(&mut self, width: f64, height: f64) -> Result<bool> {
        self.shared_source()?;
        match self.resize.observe(width, height) {
            Ok(true) => {
                self.viewport.resize(width, height);
                self.viewport.clamp_scroll(&self.layout);
                self.render()?;
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(err) => {
                let (w, h) = self.resize.size();
                tracing::warn!("ignoring container measurement ({err}); keeping {w}x{h}");
                Ok(false)
            }
        }
    }

    // ---- Sizing ----

    pub fn set_row_height(&mut self, row: usize, height: f64) -> Result<()> {
        self.shared_source()?;
        let height = check_size("row", height)?;
        GridError::check_row(row, self.layout.row_count())?;
        self.layout.rows.set_size(row, height);
        self.viewport.clamp_scroll(&self.layout);
        self.render()
    }

    /// Set a column width (clamped to the column minimum). Returns the
    /// applied width.
    pub fn set_column_width(&mut self, column: &str, width: f64) -> Result<f64> {
        self.shared_source()?;
        let width = check_size("column", width)?;
        let idx = self.columns.require(column)?;
        let applied = self.columns.set_width(column, width)?;
        self.layout.cols.set_size(idx, applied);
        self.viewport.clamp_scroll(&self.layout);
        self.render()?;
        Ok(applied)
    }

    /// Move a column from display index `from` to `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        self.shared_source()?;
        self.columns.move_column(from, to)?;
        self.layout.rebuild_columns(&self.columns);
        self.render()
    }

    // ---- Data source ----

    /// Pick up row inserts/removals and column changes made by the host.
    pub fn sync_with_source(&mut self) -> Result<()> {
        self.render()
    }

    /// Swap in a different data source. The open edit and any outstanding
    /// commits belong to the old source and are dropped; columns are laid out
    /// afresh in the new source's order with the configured widths.
    pub fn set_data_source(&mut self, source: SharedSource) -> Result<()> {
        self.shared_source()?;
        if self.editor.is_editing() || !self.editor.pending().is_empty() {
            tracing::debug!("data source replaced; dropping edit state");
        }
        self.editor.reset();
        self.unmount_all();
        let keys = source.borrow().column_keys();
        self.columns = ColumnSet::new(
            &keys,
            self.config.default_column_width,
            self.config.min_column_width,
            &self.config.column_widths,
        );
        self.layout.rebuild_columns(&self.columns);
        self.source = Some(source);
        self.render()
    }

    /// Reconcile layout with the source's current shape. Returns `true` when
    /// rows or columns changed.
    fn sync_shape(&mut self, row_count: usize, keys: &[String]) -> bool {
        let mut changed = false;
        if self.columns.sync_keys(
            keys,
            self.config.default_column_width,
            self.config.min_column_width,
            &self.config.column_widths,
        ) {
            self.layout.rebuild_columns(&self.columns);
            changed = true;
        }
        let old_rows = self.layout.row_count();
        if row_count != old_rows {
            self.layout.rows.resize(row_count);
            for (&row, &height) in &self.config.row_heights {
                if row >= old_rows && row < row_count {
                    self.layout.rows.set_size(row, height);
                }
            }
            changed = true;
        }
        if changed {
            tracing::debug!(rows = row_count, columns = keys.len(), "layout synced");
            let stale = self
                .editor
                .session()
                .is_some_and(|s| s.row >= row_count || self.columns.position(&s.column).is_none());
            if stale {
                self.editor.cancel();
            }
            self.viewport.clamp_scroll(&self.layout);
        }
        changed
    }

    // ---- Rendering ----

    /// Run one virtualization pass and materialize the resulting window.
    pub fn render(&mut self) -> Result<()> {
        let source = self.shared_source()?;
        let src = source.borrow();
        let keys = src.column_keys();
        self.sync_shape(src.row_count(), &keys);

        self.surface
            .set_content_size(self.layout.total_width(), self.layout.total_height());
        let window = self.virtualizer.window(&self.viewport, &self.layout);
        self.window = window;

        // Cancel-on-scroll-out.
        let out_of_window = |row: usize, column: &str| {
            let col = self.columns.position(column);
            !matches!((window, col), (Some(w), Some(c)) if w.contains(row, c))
        };
        if self
            .editor
            .session()
            .is_some_and(|s| out_of_window(s.row, &s.column))
        {
            self.editor.cancel();
        }
        if self
            .editor
            .queued()
            .is_some_and(|(row, column)| out_of_window(row, column))
        {
            self.editor.clear_queued();
        }

        let mut next: HashSet<(usize, String)> = HashSet::new();
        if let Some(w) = window {
            next.reserve(w.cell_count());
            for row in w.rows.iter() {
                for col in w.cols.iter() {
                    if let Some(column) = self.columns.get(col) {
                        next.insert((row, column.key.clone()));
                    }
                }
            }
        }

        for (row, column) in self.mounted.difference(&next) {
            self.surface.unmount(*row, column);
        }

        if let Some(w) = window {
            for row in w.rows.iter() {
                for col in w.cols.iter() {
                    let (Some(column), Some(rect)) =
                        (self.columns.get(col), self.layout.cell_rect(row, col))
                    else {
                        continue;
                    };
                    let editing = self.editor.is_editing_cell(row, &column.key);
                    let committed;
                    let value = match self.editor.session() {
                        Some(session) if editing => &session.draft,
                        _ => {
                            committed = src.value(row, &column.key)?;
                            &committed
                        }
                    };
                    let view = CellView {
                        row,
                        column: &column.key,
                        col,
                        rect,
                        value,
                        editing,
                    };
                    if self.mounted.contains(&(row, column.key.clone())) {
                        self.surface.update(&view);
                    } else {
                        self.surface.mount(&view);
                    }
                }
            }
        }

        tracing::trace!(cells = next.len(), "render pass");
        self.mounted = next;
        Ok(())
    }

    fn unmount_all(&mut self) {
        self.surface.clear();
        self.mounted.clear();
        self.window = None;
    }

    // ---- Editing ----

    /// Open an edit session on `(row, column)`.
    ///
    /// An edit already open on another cell is committed first.
    pub fn begin_edit(&mut self, row: usize, column: &str) -> Result<BeginEdit> {
        let source = self.shared_source()?;
        let reshaped = {
            let src = source.borrow();
            let keys = src.column_keys();
            let reshaped = self.sync_shape(src.row_count(), &keys);
            GridError::check_row(row, src.row_count())?;
            reshaped
        };
        if reshaped {
            // The window from the last pass predates the new shape.
            self.render()?;
        }
        let col = self.columns.require(column)?;

        if self.editor.is_editing_cell(row, column) {
            return Ok(BeginEdit {
                previous: None,
                status: EditStatus::AlreadyEditing,
            });
        }

        let previous = if self.editor.is_editing() {
            Some(self.commit_edit()?)
        } else {
            None
        };

        let visible = self.window.is_some_and(|w| w.contains(row, col));
        let status = if !visible {
            EditStatus::NotVisible
        } else if self.editor.is_pending(row, column) {
            tracing::debug!(row, column, "activation queued behind in-flight commit");
            self.editor.queue(row, column);
            EditStatus::Queued
        } else {
            let original = source.borrow().value(row, column)?;
            self.editor.open(row, column, original);
            self.render()?;
            EditStatus::Started
        };

        Ok(BeginEdit { previous, status })
    }

    /// Replace the draft of the open session. `false` when nothing is being
    /// edited.
    pub fn update_draft(&mut self, value: CellValue) -> Result<bool> {
        self.shared_source()?;
        if self.editor.set_draft(value) {
            self.render()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Write the draft back to the data source.
    pub fn commit_edit(&mut self) -> Result<CommitOutcome> {
        let source = self.shared_source()?;
        let Some(session) = self.editor.take_session() else {
            return Ok(CommitOutcome::NoSession);
        };
        let change = CellChange {
            row: session.row,
            column: session.column.clone(),
            value: session.draft.clone(),
        };

        let ack = source
            .borrow_mut()
            .set_value(session.row, &session.column, session.draft.clone());
        let outcome = match ack {
            Ok(WriteAck::Applied) => {
                self.dispatcher.dispatch(&change);
                CommitOutcome::Committed(change)
            }
            Ok(WriteAck::Deferred) => {
                let ticket = self.editor.track_pending(session);
                tracing::debug!(ticket = ticket.as_u32(), "commit awaiting acknowledgement");
                CommitOutcome::Pending { ticket, change }
            }
            Ok(WriteAck::Rejected(reason)) => {
                tracing::warn!(
                    row = change.row,
                    column = %change.column,
                    "commit rejected by data source: {reason}"
                );
                CommitOutcome::Reverted { change, reason }
            }
            Err(err) => {
                self.render()?;
                return Err(err);
            }
        };
        self.render()?;
        Ok(outcome)
    }

    /// Discard the open session. `false` when nothing was being edited.
    pub fn cancel_edit(&mut self) -> Result<bool> {
        self.shared_source()?;
        if self.editor.cancel().is_some() {
            self.render()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Resolve a deferred commit.
    ///
    /// On success the change event fires; on failure the original value is
    /// restored in the data source and no event fires. A queued activation
    /// for the same cell then opens. Unknown tickets yield `Ok(None)`.
    pub fn settle_commit(
        &mut self,
        ticket: CommitTicket,
        result: std::result::Result<(), String>,
    ) -> Result<Option<CommitOutcome>> {
        let source = self.shared_source()?;
        let Some(pending) = self.editor.resolve(ticket) else {
            return Ok(None);
        };
        let change = CellChange {
            row: pending.row,
            column: pending.column.clone(),
            value: pending.value,
        };

        let outcome = match result {
            Ok(()) => {
                self.dispatcher.dispatch(&change);
                CommitOutcome::Committed(change)
            }
            Err(reason) => {
                tracing::warn!(
                    row = change.row,
                    column = %change.column,
                    "deferred commit failed: {reason}"
                );
                let in_range = pending.row < source.borrow().row_count();
                if in_range {
                    if let Err(err) =
                        source
                            .borrow_mut()
                            .restore_value(pending.row, &pending.column, pending.original)
                    {
                        tracing::warn!("could not restore original value: {err}");
                    }
                }
                CommitOutcome::Reverted { change, reason }
            }
        };

        // The outcome is already delivered; what follows must not mask it.
        let reopen =
            self.editor.take_queued_for(pending.row, &pending.column) && !self.editor.is_editing();
        let followup = if reopen {
            self.begin_edit(pending.row, &pending.column).map(|_| ())
        } else {
            self.render()
        };
        if let Err(err) = followup {
            tracing::warn!(
                row = pending.row,
                column = %pending.column,
                "after settlement: {err}"
            );
            if reopen {
                if let Err(err) = self.render() {
                    tracing::warn!("render after settlement failed: {err}");
                }
            }
        }
        Ok(Some(outcome))
    }

    // ---- Teardown ----

    /// Detach resize observation, unmount every cell and release the data
    /// source. Idempotent; every other operation fails with
    /// `GridError::Disposed` afterwards.
    pub fn dispose(&mut self) {
        if self.source.is_none() {
            return;
        }
        self.resize.detach();
        self.editor.reset();
        self.dispatcher.clear();
        self.unmount_all();
        self.source = None;
        tracing::debug!("grid disposed");
    }
}

impl<S: CellSurface> std::fmt::Debug for Grid<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("rows", &self.layout.row_count())
            .field("columns", &self.columns.len())
            .field("viewport", &self.viewport)
            .field("window", &self.window)
            .field("editing", &self.editing_cell())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
