//! Viewport and virtualization tests
//!
//! Which cells get materialized for a scroll position and viewport size, and
//! how the materialized set follows scrolling, resizing and data changes.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use common::{keys, labelled_grid, letters};
use test_case::test_case;
use vgrid::layout::{ColumnSet, GridLayout, Viewport};
use vgrid::virtualizer::visible_range;
use vgrid::{
    shared, ArrayDataSource, CellValue, DataSource, Grid, GridConfig, MemorySurface, Virtualizer,
    VisibleRange,
};

/// Create a layout with uniform row/column sizes
fn create_test_layout(rows: usize, cols: usize, row_height: f64, col_width: f64) -> GridLayout {
    let columns = ColumnSet::new(&letters(cols), col_width, 16.0, &HashMap::new());
    GridLayout::new(rows, row_height, &HashMap::new(), &columns, col_width)
}

fn mounted_rows(grid: &Grid<MemorySurface>) -> Vec<usize> {
    let rows: HashSet<usize> = grid.surface().coords().map(|(r, _)| r).collect();
    let mut rows: Vec<usize> = rows.into_iter().collect();
    rows.sort_unstable();
    rows
}

#[test]
fn test_scrolled_window_with_overscan() {
    let (_source, mut grid) = labelled_grid(20, 5, 500.0, 200.0);
    let window = grid.scroll_to(0.0, 280.0).unwrap().unwrap();

    assert_eq!(window.rows, VisibleRange { first: 8, last: 19 });
    assert_eq!(window.cols, VisibleRange { first: 0, last: 4 });
    assert_eq!(mounted_rows(&grid), (8..=19).collect::<Vec<_>>());
    assert_eq!(grid.surface().len(), 12 * 5);
    assert_eq!(grid.surface().text(10, "C"), Some("10C"));
    assert!(grid.surface().cell(7, "A").is_none());
}

#[test]
fn test_window_without_overscan_is_minimal() {
    let layout = create_test_layout(20, 5, 28.0, 100.0);
    let mut viewport = Viewport::new(500.0, 200.0);
    viewport.set_scroll(0.0, 280.0, &layout);

    let rows = Virtualizer::new(0).visible_rows(&viewport, &layout).unwrap();
    assert_eq!(rows, VisibleRange { first: 10, last: 17 });
}

/// Every row whose span intersects the viewport is inside the range, and the
/// range adds at most `overscan` rows on either side.
#[test]
fn test_visible_range_covers_viewport() {
    let overrides: HashMap<usize, f64> = (0..200)
        .map(|i| (i, 10.0 + (i % 7) as f64 * 9.0))
        .collect();
    let layout = GridLayout::new(
        200,
        28.0,
        &overrides,
        &ColumnSet::new(&letters(1), 100.0, 16.0, &HashMap::new()),
        100.0,
    );
    let axis = &layout.rows;

    for overscan in [0usize, 2] {
        let mut start = 0.0;
        while start < axis.total() {
            let extent = 173.0;
            let range = visible_range(axis, start, extent, overscan).unwrap();
            let end = start + extent;
            let intersecting: Vec<usize> = (0..axis.len())
                .filter(|&i| {
                    let top = axis.offset(i).unwrap();
                    let bottom = axis.offset(i + 1).unwrap();
                    bottom > start && top < end
                })
                .collect();
            let first = *intersecting.first().unwrap();
            let last = *intersecting.last().unwrap();
            assert_eq!(range.first, first.saturating_sub(overscan), "start {start}");
            assert_eq!(range.last, (last + overscan).min(axis.len() - 1), "start {start}");
            start += 37.0;
        }
    }
}

#[test_case(0.0, 200.0 ; "zero width")]
#[test_case(500.0, 0.0 ; "zero height")]
fn test_zero_sized_viewport_materializes_nothing(width: f64, height: f64) {
    let (_source, mut grid) = labelled_grid(20, 5, 500.0, 200.0);
    assert!(!grid.surface().is_empty());
    grid.observe_size(width, height).unwrap();
    assert_eq!(grid.window(), None);
    assert!(grid.surface().is_empty());
}

#[test]
fn test_empty_source_has_no_window() {
    let source = shared(ArrayDataSource::with_rows(keys(&["A", "B"]), 0));
    let mut grid = Grid::new(source, GridConfig::default(), MemorySurface::new()).unwrap();
    grid.observe_size(500.0, 200.0).unwrap();
    assert_eq!(grid.window(), None);
    assert_eq!(grid.surface().content_size(), (200.0, 0.0));
}

#[test]
fn test_scroll_is_clamped() {
    let (_source, mut grid) = labelled_grid(20, 5, 500.0, 200.0);
    grid.scroll_to(-100.0, 10_000.0).unwrap();
    assert_eq!(grid.viewport().scroll_x, 0.0);
    assert_eq!(grid.viewport().scroll_y, 20.0 * 28.0 - 200.0);
    assert_eq!(grid.window().unwrap().rows.last, 19);

    grid.scroll_by(0.0, -30.0).unwrap();
    assert_eq!(grid.viewport().scroll_y, 330.0);
}

#[test]
fn test_scrolling_unmounts_cells_that_leave() {
    let (_source, mut grid) = labelled_grid(1_000, 3, 300.0, 280.0);
    let first = grid.window().unwrap();
    assert_eq!(first.rows, VisibleRange { first: 0, last: 11 });

    grid.scroll_to(0.0, 28_000.0).unwrap();
    let rows = mounted_rows(&grid);
    assert_eq!(rows.first(), Some(&988));
    assert_eq!(rows.last(), Some(&999));
    assert!(grid.surface().cell(0, "A").is_none());
    assert_eq!(grid.surface().unmount_count(), 12 * 3);
}

#[test]
fn test_rerender_with_same_inputs_is_idempotent() {
    let (_source, mut grid) = labelled_grid(50, 5, 320.0, 240.0);
    grid.scroll_to(35.0, 410.0).unwrap();
    let window = grid.window();
    let cells: Vec<(usize, String)> = grid
        .surface()
        .coords()
        .map(|(r, c)| (r, c.to_string()))
        .collect();
    let mounts = grid.surface().mount_count();

    grid.render().unwrap();
    grid.scroll_to(35.0, 410.0).unwrap();

    assert_eq!(grid.window(), window);
    let again: Vec<(usize, String)> = grid
        .surface()
        .coords()
        .map(|(r, c)| (r, c.to_string()))
        .collect();
    assert_eq!(again, cells);
    assert_eq!(grid.surface().mount_count(), mounts);
}

#[test]
fn test_resize_observation_is_idempotent() {
    let (_source, mut grid) = labelled_grid(20, 5, 500.0, 200.0);
    let mounts = grid.surface().mount_count();

    assert!(!grid.observe_size(500.0, 200.0).unwrap());
    assert_eq!(grid.surface().mount_count(), mounts);

    assert!(grid.observe_size(500.0, 400.0).unwrap());
    assert_eq!(grid.window().unwrap().rows.last, 16);
}

#[test]
fn test_bad_measurement_keeps_last_size() {
    let (_source, mut grid) = labelled_grid(20, 5, 500.0, 200.0);
    let window = grid.window();
    assert!(!grid.observe_size(f64::NAN, 100.0).unwrap());
    assert!(!grid.observe_size(-1.0, 100.0).unwrap());
    assert_eq!(grid.viewport().height, 200.0);
    assert_eq!(grid.window(), window);
}

#[test]
fn test_rows_added_and_removed_by_host() {
    let (source, mut grid) = labelled_grid(5, 2, 300.0, 400.0);
    assert_eq!(grid.window().unwrap().rows.last, 4);

    let row = HashMap::from([("A".to_string(), CellValue::from("new"))]);
    source.borrow_mut().push_row(row);
    grid.sync_with_source().unwrap();
    assert_eq!(grid.layout().row_count(), 6);
    assert_eq!(grid.surface().text(5, "A"), Some("new"));

    source.borrow_mut().remove_row(0).unwrap();
    source.borrow_mut().remove_row(0).unwrap();
    grid.sync_with_source().unwrap();
    assert_eq!(grid.layout().row_count(), 4);
    assert!(grid.surface().cell(4, "A").is_none());
    assert_eq!(grid.surface().text(0, "A"), Some("2A"));
}

#[test]
fn test_row_height_overrides_apply_to_new_rows() {
    let source = shared(ArrayDataSource::with_rows(keys(&["A"]), 2));
    let config = GridConfig {
        row_heights: HashMap::from([(3, 50.0)]),
        ..GridConfig::default()
    };
    let handle = Rc::clone(&source);
    let mut grid = Grid::new(handle, config, MemorySurface::new()).unwrap();
    grid.observe_size(100.0, 400.0).unwrap();
    assert_eq!(grid.layout().total_height(), 56.0);

    for _ in 0..3 {
        source.borrow_mut().push_row(HashMap::new());
    }
    grid.sync_with_source().unwrap();
    assert_eq!(grid.layout().rows.size(3), Some(50.0));
    assert_eq!(grid.layout().total_height(), 4.0 * 28.0 + 50.0);
}

#[test]
fn test_replacing_data_source() {
    let (_source, mut grid) = labelled_grid(20, 5, 500.0, 200.0);
    grid.scroll_to(0.0, 280.0).unwrap();

    let replacement = shared(ArrayDataSource::with_rows(keys(&["X", "Y"]), 3));
    replacement
        .borrow_mut()
        .set_value(1, "Y", CellValue::Number(7.5))
        .unwrap();
    grid.set_data_source(replacement).unwrap();

    assert_eq!(grid.layout().row_count(), 3);
    assert_eq!(grid.viewport().scroll_y, 0.0);
    assert_eq!(grid.surface().len(), 6);
    assert_eq!(grid.surface().text(1, "Y"), Some("7.5"));
    assert!(grid.surface().cell(10, "A").is_none());
}
