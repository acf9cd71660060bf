//! Shared helpers for the integration tests.
//!
//! - builders for grids over in-memory data
//! - `ScriptedSource`, a data source whose write acknowledgement is chosen
//!   by the test
//! - a recorder for change notifications
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::cell::RefCell;
use std::rc::Rc;

use vgrid::{
    shared, ArrayDataSource, CellChange, CellValue, DataSource, Grid, GridConfig, MemorySurface,
    Result, WriteAck,
};

pub fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Column keys "A", "B", ... for the first `n` letters.
pub fn letters(n: usize) -> Vec<String> {
    (b'A'..=b'Z').take(n).map(|c| char::from(c).to_string()).collect()
}

/// Rows where every cell holds its coordinates, e.g. "3B".
pub fn labelled_source(rows: usize, cols: usize) -> ArrayDataSource {
    let columns = letters(cols);
    let mut source = ArrayDataSource::with_rows(columns.clone(), rows);
    for row in 0..rows {
        for key in &columns {
            source
                .set_value(row, key, CellValue::Text(format!("{row}{key}")))
                .unwrap();
        }
    }
    source
}

/// Grid over a labelled source, sized and rendered.
pub fn labelled_grid(
    rows: usize,
    cols: usize,
    width: f64,
    height: f64,
) -> (Rc<RefCell<ArrayDataSource>>, Grid<MemorySurface>) {
    let source = shared(labelled_source(rows, cols));
    let handle = Rc::clone(&source);
    let mut grid = Grid::new(handle, GridConfig::default(), MemorySurface::new()).unwrap();
    grid.observe_size(width, height).unwrap();
    (source, grid)
}

/// Collect every change the grid dispatches.
pub fn record_changes(grid: &mut Grid<MemorySurface>) -> Rc<RefCell<Vec<CellChange>>> {
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    grid.subscribe(move |change| {
        sink.borrow_mut().push(change.clone());
        Ok(())
    });
    changes
}

/// How `ScriptedSource` acknowledges writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckMode {
    Apply,
    Defer,
    Reject,
}

/// Data source wrapping an `ArrayDataSource` with a scripted acknowledgement.
#[derive(Debug)]
pub struct ScriptedSource {
    pub inner: ArrayDataSource,
    pub mode: AckMode,
    pub writes: Vec<(usize, String, CellValue)>,
    pub restores: Vec<(usize, String, CellValue)>,
}

impl ScriptedSource {
    pub fn new(inner: ArrayDataSource, mode: AckMode) -> Self {
        Self {
            inner,
            mode,
            writes: Vec::new(),
            restores: Vec::new(),
        }
    }
}

impl DataSource for ScriptedSource {
    fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    fn column_keys(&self) -> Vec<String> {
        self.inner.column_keys()
    }

    fn value(&self, row: usize, key: &str) -> Result<CellValue> {
        self.inner.value(row, key)
    }

    fn set_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<WriteAck> {
        self.writes.push((row, key.to_string(), value.clone()));
        match self.mode {
            AckMode::Apply => self.inner.set_value(row, key, value),
            AckMode::Defer => {
                self.inner.set_value(row, key, value)?;
                Ok(WriteAck::Deferred)
            }
            AckMode::Reject => {
                self.inner.value(row, key)?;
                Ok(WriteAck::Rejected("read-only".to_string()))
            }
        }
    }

    fn restore_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<()> {
        self.restores.push((row, key.to_string(), value.clone()));
        self.inner.set_value(row, key, value).map(|_| ())
    }
}

/// Grid over a labelled `ScriptedSource`, sized and rendered.
pub fn scripted_grid(
    rows: usize,
    cols: usize,
    mode: AckMode,
) -> (Rc<RefCell<ScriptedSource>>, Grid<MemorySurface>) {
    let source = shared(ScriptedSource::new(labelled_source(rows, cols), mode));
    let handle = Rc::clone(&source);
    let mut grid = Grid::new(handle, GridConfig::default(), MemorySurface::new()).unwrap();
    grid.observe_size(500.0, 200.0).unwrap();
    (source, grid)
}
