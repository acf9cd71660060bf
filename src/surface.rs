//! Materialization targets.
//!
//! The grid decides *which* cells exist; a [`CellSurface`] decides what a
//! materialized cell looks like. The browser binding maps cells onto DOM
//! elements, [`MemorySurface`] keeps them in a map for headless use.

use std::collections::BTreeMap;

use crate::layout::CellRect;
use crate::value::CellValue;

/// Everything needed to draw one cell during a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CellView<'a> {
    pub row: usize,
    pub column: &'a str,
    /// Display index of the column
    pub col: usize,
    /// Bounds in grid coordinates
    pub rect: CellRect,
    /// Committed value, or the draft for the cell being edited
    pub value: &'a CellValue,
    pub editing: bool,
}

/// Receives mount/update/unmount calls from the grid.
pub trait CellSurface {
    /// Size of the scrollable content area.
    fn set_content_size(&mut self, width: f64, height: f64);

    /// A cell entered the window.
    fn mount(&mut self, cell: &CellView<'_>);

    /// A cell that stays in the window is redrawn.
    fn update(&mut self, cell: &CellView<'_>);

    /// A cell left the window.
    fn unmount(&mut self, row: usize, column: &str);

    /// Drop every materialized cell.
    fn clear(&mut self);
}

/// A cell as recorded by [`MemorySurface`].
#[derive(Debug, Clone, PartialEq)]
pub struct MountedCell {
    pub rect: CellRect,
    pub text: String,
    pub editing: bool,
}

/// Headless surface keeping materialized cells in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    cells: BTreeMap<(usize, String), MountedCell>,
    content_size: (f64, f64),
    mounts: usize,
    unmounts: usize,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&MountedCell> {
        self.cells.get(&(row, column.to_string()))
    }

    /// Displayed text of a materialized cell.
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.cell(row, column).map(|c| c.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Materialized `(row, column)` pairs in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells.keys().map(|(r, c)| (*r, c.as_str()))
    }

    pub fn content_size(&self) -> (f64, f64) {
        self.content_size
    }

    /// Total mount calls received.
    pub fn mount_count(&self) -> usize {
        self.mounts
    }

    /// Total unmount calls received.
    pub fn unmount_count(&self) -> usize {
        self.unmounts
    }

    fn record(&mut self, cell: &CellView<'_>) {
        self.cells.insert(
            (cell.row, cell.column.to_string()),
            MountedCell {
                rect: cell.rect,
                text: cell.value.to_string(),
                editing: cell.editing,
            },
        );
    }
}

impl CellSurface for MemorySurface {
    fn set_content_size(&mut self, width: f64, height: f64) {
        self.content_size = (width, height);
    }

    fn mount(&mut self, cell: &CellView<'_>) {
        self.mounts += 1;
        self.record(cell);
    }

    fn update(&mut self, cell: &CellView<'_>) {
        self.record(cell);
    }

    fn unmount(&mut self, row: usize, column: &str) {
        if self.cells.remove(&(row, column.to_string())).is_some() {
            self.unmounts += 1;
        }
    }

    fn clear(&mut self) {
        self.unmounts += self.cells.len();
        self.cells.clear();
    }
}
