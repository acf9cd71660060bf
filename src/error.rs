//! Structured error types for vgrid.
//!
//! Only contract violations, bad configuration, host failures and use of a
//! disposed grid are errors. Commit failures are ordinary values (see
//! `editor::CommitOutcome`).

/// All errors the grid engine reports to its host.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Row index outside `[0, row_count)`.
    #[error("row index {row} out of range (row count {row_count})")]
    RowOutOfRange { row: usize, row_count: usize },

    /// Column key not known to the data source.
    #[error("unknown column key: {0}")]
    UnknownColumn(String),

    /// Column display index outside the column set.
    #[error("column index {index} out of range (column count {count})")]
    ColumnOutOfRange { index: usize, count: usize },

    /// A row height or column width that is not a positive finite number.
    #[error("invalid {axis} size: {size}")]
    InvalidSize { axis: &'static str, size: f64 },

    /// Configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The grid was disposed; no further operations are accepted.
    #[error("grid has been disposed")]
    Disposed,

    /// Failure reported by the JavaScript host (browser binding only).
    #[error("host error: {0}")]
    Host(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl GridError {
    /// Shorthand used by data sources when validating a row index.
    pub fn check_row(row: usize, row_count: usize) -> Result<()> {
        if row < row_count {
            Ok(())
        } else {
            Err(Self::RowOutOfRange { row, row_count })
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
