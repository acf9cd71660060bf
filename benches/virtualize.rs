//! Benchmarks for layout and virtualization.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::cast_precision_loss)]

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vgrid::layout::{AxisLayout, ColumnSet, GridLayout, Viewport};
use vgrid::{shared, ArrayDataSource, Grid, GridConfig, MemorySurface, Virtualizer};

fn keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("c{i}")).collect()
}

/// Build the row axis for increasingly large tables
fn bench_axis_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("axis_build");
    for count in [1_000usize, 100_000, 1_000_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| AxisLayout::new(black_box(count), 28.0, &HashMap::new()))
        });
    }
    group.finish();
}

/// Binary search for the row under a scroll offset
fn bench_index_at(c: &mut Criterion) {
    let axis = AxisLayout::new(1_000_000, 28.0, &HashMap::new());
    let total = axis.total();
    c.bench_function("index_at_1m", |b| {
        let mut pos = 0.0;
        b.iter(|| {
            pos = (pos + 7_919.0) % total;
            axis.index_at(black_box(pos))
        })
    });
}

/// One row resize in a large table (suffix patch)
fn bench_set_size(c: &mut Criterion) {
    let mut axis = AxisLayout::new(100_000, 28.0, &HashMap::new());
    c.bench_function("set_size_middle_100k", |b| {
        let mut toggle = false;
        b.iter(|| {
            toggle = !toggle;
            axis.set_size(black_box(50_000), if toggle { 40.0 } else { 28.0 })
        })
    });
}

/// Window computation alone
fn bench_window(c: &mut Criterion) {
    let columns = ColumnSet::new(&keys(50), 100.0, 16.0, &HashMap::new());
    let layout = GridLayout::new(1_000_000, 28.0, &HashMap::new(), &columns, 100.0);
    let virtualizer = Virtualizer::new(2);
    let mut viewport = Viewport::new(1280.0, 800.0);
    c.bench_function("window_1m_rows", |b| {
        let mut y = 0.0;
        b.iter(|| {
            y += 997.0;
            viewport.set_scroll(0.0, y % layout.total_height(), &layout);
            virtualizer.window(black_box(&viewport), &layout)
        })
    });
}

/// Full scroll step: virtualize and materialize onto a headless surface
fn bench_scroll_render(c: &mut Criterion) {
    let source = shared(ArrayDataSource::with_rows(keys(20), 100_000));
    let mut grid =
        Grid::new(source, GridConfig::default(), MemorySurface::new()).expect("grid");
    grid.observe_size(1280.0, 800.0).expect("size");

    c.bench_function("scroll_render_100k", |b| {
        let mut y = 0.0;
        b.iter(|| {
            y = (y + 140.0) % 2_000_000.0;
            grid.scroll_to(0.0, black_box(y)).expect("scroll")
        })
    });
}

criterion_group!(
    benches,
    bench_axis_build,
    bench_index_at,
    bench_set_size,
    bench_window,
    bench_scroll_render,
);

criterion_main!(benches);
