//! Viewport virtualization.
//!
//! Picks the minimal contiguous row/column index ranges intersecting the
//! viewport, then widens them by an overscan margin. Everything here is a pure
//! function of the viewport and the layout, so re-running it with unchanged
//! inputs yields the same window.

use crate::layout::{AxisLayout, GridLayout, Viewport};

/// Extra rows/cols materialized around the viewport by default.
pub const DEFAULT_OVERSCAN: usize = 2;

/// Inclusive index range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub first: usize,
    pub last: usize,
}

impl VisibleRange {
    pub fn contains(&self, index: usize) -> bool {
        self.first <= index && index <= self.last
    }

    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<usize> {
        self.first..=self.last
    }
}

/// Rows × columns that should be materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellWindow {
    pub rows: VisibleRange,
    pub cols: VisibleRange,
}

impl CellWindow {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.rows.contains(row) && self.cols.contains(col)
    }

    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.cols.len()
    }
}

/// Range of items whose spans intersect `[start, start + extent)`, widened by
/// `overscan` on each side and clamped to the axis.
///
/// `None` for an empty axis or a viewport with no extent.
pub fn visible_range(
    axis: &AxisLayout,
    start: f64,
    extent: f64,
    overscan: usize,
) -> Option<VisibleRange> {
    if axis.is_empty() || extent.is_nan() || extent <= 0.0 || !start.is_finite() {
        return None;
    }
    let last_index = axis.len() - 1;
    let first = axis.index_at(start)?;

    // Last item whose leading edge lies strictly before the viewport's end.
    let end = start + extent;
    let before_end = axis
        .offsets()
        .get(..axis.len())
        .map_or(0, |leading| leading.partition_point(|&o| o < end));
    let last = before_end.saturating_sub(1).clamp(first, last_index);

    Some(VisibleRange {
        first: first.saturating_sub(overscan),
        last: last.saturating_add(overscan).min(last_index),
    })
}

/// Computes the cell window for a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Virtualizer {
    pub overscan: usize,
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self {
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl Virtualizer {
    pub fn new(overscan: usize) -> Self {
        Self { overscan }
    }

    /// Visible row range (inclusive, with overscan).
    pub fn visible_rows(&self, viewport: &Viewport, layout: &GridLayout) -> Option<VisibleRange> {
        visible_range(&layout.rows, viewport.scroll_y, viewport.height, self.overscan)
    }

    /// Visible column range (inclusive, with overscan).
    pub fn visible_cols(&self, viewport: &Viewport, layout: &GridLayout) -> Option<VisibleRange> {
        visible_range(&layout.cols, viewport.scroll_x, viewport.width, self.overscan)
    }

    /// Window of cells to materialize, or `None` when nothing is visible.
    pub fn window(&self, viewport: &Viewport, layout: &GridLayout) -> Option<CellWindow> {
        Some(CellWindow {
            rows: self.visible_rows(viewport, layout)?,
            cols: self.visible_cols(viewport, layout)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_uniform_rows_scenario() {
        // 20 rows of 28px, scrolled to 280 with a 200px viewport.
        let axis = AxisLayout::new(20, 28.0, &HashMap::new());
        let range = visible_range(&axis, 280.0, 200.0, 2).unwrap();
        assert_eq!(range, VisibleRange { first: 8, last: 19 });

        let strict = visible_range(&axis, 280.0, 200.0, 0).unwrap();
        assert_eq!(strict, VisibleRange { first: 10, last: 17 });
    }

    #[test]
    fn test_boundary_row_excluded() {
        // Viewport ends exactly on a row edge: that row is not visible.
        let axis = AxisLayout::new(10, 10.0, &HashMap::new());
        let range = visible_range(&axis, 0.0, 30.0, 0).unwrap();
        assert_eq!(range, VisibleRange { first: 0, last: 2 });
    }

    #[test]
    fn test_empty_inputs() {
        let axis = AxisLayout::new(10, 10.0, &HashMap::new());
        assert_eq!(visible_range(&axis, 0.0, 0.0, 2), None);
        assert_eq!(visible_range(&axis, 0.0, f64::NAN, 2), None);
        let empty = AxisLayout::new(0, 10.0, &HashMap::new());
        assert_eq!(visible_range(&empty, 0.0, 100.0, 2), None);
    }

    #[test]
    fn test_overscan_clamped_at_edges() {
        let axis = AxisLayout::new(5, 10.0, &HashMap::new());
        let range = visible_range(&axis, 0.0, 1000.0, 3).unwrap();
        assert_eq!(range, VisibleRange { first: 0, last: 4 });
    }

    /// Every row intersecting the viewport is included, exactly `overscan`
    /// extra rows on each side (clamped), nothing else.
    #[test]
    fn test_range_matches_brute_force() {
        let sizes: Vec<f64> = (0..200).map(|i| f64::from(10 + (i * 7) % 23)).collect();
        let axis = AxisLayout::from_sizes(sizes, 10.0);
        let extent = 137.0;
        let max_scroll = axis.total() - extent;
        let overscan = 3;

        let mut scroll = 0.0;
        while scroll <= max_scroll {
            let range = visible_range(&axis, scroll, extent, overscan).unwrap();
            let intersecting: Vec<usize> = (0..axis.len())
                .filter(|&i| {
                    let top = axis.offset(i).unwrap();
                    let bottom = top + axis.size(i).unwrap();
                    top < scroll + extent && bottom > scroll
                })
                .collect();
            let lo = intersecting[0];
            let hi = *intersecting.last().unwrap();
            assert_eq!(range.first, lo.saturating_sub(overscan), "scroll {scroll}");
            assert_eq!(range.last, (hi + overscan).min(axis.len() - 1), "scroll {scroll}");
            scroll += 3.5;
        }
    }

    #[test]
    fn test_window_is_idempotent() {
        let keys: Vec<String> = (0..5).map(|i| format!("c{i}")).collect();
        let set = crate::layout::ColumnSet::new(&keys, 100.0, 16.0, &HashMap::new());
        let layout = GridLayout::new(20, 28.0, &HashMap::new(), &set, 100.0);
        let mut viewport = Viewport::new(250.0, 200.0);
        viewport.set_scroll(120.0, 280.0, &layout);

        let virtualizer = Virtualizer::default();
        let first = virtualizer.window(&viewport, &layout).unwrap();
        let second = virtualizer.window(&viewport, &layout).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.cols, VisibleRange { first: 0, last: 4 });
        assert!(first.contains(10, 1));
        assert!(!first.contains(7, 1));
    }
}
