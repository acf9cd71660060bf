//! Pre-computed layout data for a grid.
//!
//! Cell positions are derived from two offset tables, built once when the
//! grid is created and patched in place afterwards, so position lookups and
//! hit testing stay O(log n).

use std::collections::HashMap;

use super::{AxisLayout, ColumnSet};

/// Row and column offset tables.
#[derive(Debug, Clone)]
pub struct GridLayout {
    /// Row heights and cumulative row positions
    pub rows: AxisLayout,
    /// Column widths and cumulative column positions, in display order
    pub cols: AxisLayout,
}

/// Rectangle representing a cell's bounds in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    /// X position (left edge)
    pub x: f64,
    /// Y position (top edge)
    pub y: f64,
    /// Width of the cell
    pub width: f64,
    /// Height of the cell
    pub height: f64,
}

/// Default row height in pixels
pub const DEFAULT_ROW_HEIGHT: f64 = 28.0;

/// Default column width in pixels
pub const DEFAULT_COL_WIDTH: f64 = 100.0;

impl GridLayout {
    /// Create a layout for `row_count` rows and the given columns.
    ///
    /// # Arguments
    /// * `row_count` - Number of rows in the data source
    /// * `default_row_height` - Height of rows without an override
    /// * `row_heights` - Map of row index to height
    /// * `columns` - Columns in display order (widths already resolved)
    pub fn new(
        row_count: usize,
        default_row_height: f64,
        row_heights: &HashMap<usize, f64>,
        columns: &ColumnSet,
        default_col_width: f64,
    ) -> Self {
        Self {
            rows: AxisLayout::new(row_count, default_row_height, row_heights),
            cols: AxisLayout::from_sizes(columns.widths(), default_col_width),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.cols.len()
    }

    /// Get cell bounds in grid coordinates
    pub fn cell_rect(&self, row: usize, col: usize) -> Option<CellRect> {
        Some(CellRect {
            x: self.cols.offset(col)?,
            y: self.rows.offset(row)?,
            width: self.cols.size(col)?,
            height: self.rows.size(row)?,
        })
    }

    /// Find row at y position (binary search)
    pub fn row_at_y(&self, y: f64) -> Option<usize> {
        self.rows.index_at(y)
    }

    /// Find column at x position (binary search)
    pub fn col_at_x(&self, x: f64) -> Option<usize> {
        self.cols.index_at(x)
    }

    /// Get total width of the grid
    pub fn total_width(&self) -> f64 {
        self.cols.total()
    }

    /// Get total height of the grid
    pub fn total_height(&self) -> f64 {
        self.rows.total()
    }

    /// Rebuild the column axis after columns were reordered or replaced.
    pub fn rebuild_columns(&mut self, columns: &ColumnSet) {
        self.cols = AxisLayout::from_sizes(columns.widths(), self.cols.default_size());
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn columns(n: usize) -> ColumnSet {
        let keys: Vec<String> = (0..n).map(|i| format!("c{i}")).collect();
        ColumnSet::new(&keys, DEFAULT_COL_WIDTH, 16.0, &HashMap::new())
    }

    #[test]
    fn test_basic_layout() {
        let layout = GridLayout::new(
            10,
            DEFAULT_ROW_HEIGHT,
            &HashMap::new(),
            &columns(5),
            DEFAULT_COL_WIDTH,
        );

        assert_eq!(layout.row_count(), 10);
        assert_eq!(layout.col_count(), 5);
        assert_eq!(layout.total_width(), DEFAULT_COL_WIDTH * 5.0);
        assert_eq!(layout.total_height(), DEFAULT_ROW_HEIGHT * 10.0);
    }

    #[test]
    fn test_cell_rect() {
        let layout = GridLayout::new(
            10,
            DEFAULT_ROW_HEIGHT,
            &HashMap::new(),
            &columns(5),
            DEFAULT_COL_WIDTH,
        );

        let rect = layout.cell_rect(0, 0).unwrap();
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 0.0);
        assert_eq!(rect.width, DEFAULT_COL_WIDTH);
        assert_eq!(rect.height, DEFAULT_ROW_HEIGHT);

        let rect = layout.cell_rect(1, 2).unwrap();
        assert_eq!(rect.x, DEFAULT_COL_WIDTH * 2.0);
        assert_eq!(rect.y, DEFAULT_ROW_HEIGHT);

        assert!(layout.cell_rect(10, 0).is_none());
        assert!(layout.cell_rect(0, 5).is_none());
    }

    #[test]
    fn test_row_at_y() {
        let mut heights = HashMap::new();
        heights.insert(1, 60.0);
        let layout = GridLayout::new(10, 20.0, &heights, &columns(1), DEFAULT_COL_WIDTH);

        assert_eq!(layout.row_at_y(0.0), Some(0));
        assert_eq!(layout.row_at_y(19.0), Some(0));
        assert_eq!(layout.row_at_y(20.0), Some(1));
        assert_eq!(layout.row_at_y(79.0), Some(1));
        assert_eq!(layout.row_at_y(80.0), Some(2));
    }

    #[test]
    fn test_col_at_x() {
        let layout = GridLayout::new(1, 20.0, &HashMap::new(), &columns(5), DEFAULT_COL_WIDTH);

        assert_eq!(layout.col_at_x(0.0), Some(0));
        assert_eq!(layout.col_at_x(50.0), Some(0));
        assert_eq!(layout.col_at_x(DEFAULT_COL_WIDTH), Some(1));
        assert_eq!(layout.col_at_x(DEFAULT_COL_WIDTH * 2.5), Some(2));
    }

    #[test]
    fn test_rebuild_columns_after_move() {
        let mut set = columns(3);
        set.set_width("c0", 300.0).unwrap();
        let mut layout = GridLayout::new(1, 20.0, &HashMap::new(), &set, DEFAULT_COL_WIDTH);
        set.move_column(0, 2).unwrap();
        layout.rebuild_columns(&set);
        assert_eq!(layout.cols.sizes(), &[100.0, 100.0, 300.0]);
        assert_eq!(layout.cols.offset(2), Some(200.0));
    }
}
