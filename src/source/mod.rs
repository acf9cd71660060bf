//! Data source abstraction.
//!
//! The grid never owns its data. Hosts hand it a [`SharedSource`] and keep a
//! clone of the handle themselves, so they can mutate or replace the backing
//! rows between renders.

mod array;

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::value::CellValue;

pub use array::ArrayDataSource;

/// Shared, single-threaded handle to a data source.
pub type SharedSource = Rc<RefCell<dyn DataSource>>;

/// Acknowledgement returned by [`DataSource::set_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteAck {
    /// The value was applied and the write is final.
    Applied,
    /// The value was applied optimistically; the host confirms or rejects it
    /// later via `Grid::settle_commit`.
    Deferred,
    /// The write failed and nothing was applied.
    Rejected(String),
}

/// Uniform read/write access to tabular data.
///
/// Row indices must be in `[0, row_count)` and column keys must be one of
/// `column_keys()`. Anything else is a contract violation and is reported as
/// an error rather than a failed write.
pub trait DataSource {
    /// Number of rows.
    fn row_count(&self) -> usize;

    /// Column keys in display order.
    fn column_keys(&self) -> Vec<String>;

    /// Read the committed value of a cell.
    fn value(&self, row: usize, key: &str) -> Result<CellValue>;

    /// Write a value. Must return immediately; asynchronous persistence is
    /// signalled with [`WriteAck::Deferred`].
    fn set_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<WriteAck>;

    /// Put back a value after a deferred write was rejected.
    fn restore_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<()> {
        self.set_value(row, key, value).map(|_| ())
    }
}

/// Wrap a concrete data source into a shared handle.
pub fn shared<D: DataSource + 'static>(source: D) -> Rc<RefCell<D>> {
    Rc::new(RefCell::new(source))
}
