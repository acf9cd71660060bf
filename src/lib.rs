//! vgrid - virtualized, editable data grid
//!
//! Renders large tabular datasets inside a fixed-size viewport:
//! - Only the cells intersecting the viewport (plus overscan) are materialized
//! - Rows and columns have independent sizes; resizing patches offsets in place
//! - In-place cell editing with commit/cancel and change notifications
//! - Headless core; the `web` module binds it to a DOM element via WebAssembly
//!
//! # Usage (Rust)
//!
//! ```
//! use vgrid::{shared, ArrayDataSource, Grid, GridConfig, MemorySurface};
//!
//! let columns = vec!["A".to_string(), "B".to_string()];
//! let source = shared(ArrayDataSource::with_rows(columns, 1_000));
//! let mut grid = Grid::new(source, GridConfig::default(), MemorySurface::new())?;
//! grid.observe_size(640.0, 480.0)?;
//! grid.scroll_to(0.0, 2_800.0)?;
//! assert!(grid.window().is_some());
//! # Ok::<(), vgrid::GridError>(())
//! ```
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { init_grid, Table, ArrayDataSource } from 'vgrid';
//! await init();
//! init_grid();
//! const dataSource = new ArrayDataSource(['A', 'B'], rows);
//! const table = new Table(host, { dataSource, defaultRowHeight: 28 });
//! host.addEventListener('cellchange', (e) => console.log(e.detail));
//! // ...
//! table.dispose();
//! ```

pub mod config;
pub mod editor;
pub mod error;
pub mod events;
pub mod grid;
pub mod layout;
pub mod resize;
pub mod source;
pub mod surface;
pub mod value;
pub mod virtualizer;

// Browser binding
#[cfg(target_arch = "wasm32")]
pub mod web;

use wasm_bindgen::prelude::*;

pub use config::GridConfig;
pub use editor::{BeginEdit, CommitOutcome, CommitTicket, EditSession, EditStatus};
pub use error::{GridError, Result};
pub use events::{CellChange, ChangeDispatcher, ListenerError, ListenerId};
pub use grid::Grid;
pub use source::{shared, ArrayDataSource, DataSource, SharedSource, WriteAck};
pub use surface::{CellSurface, CellView, MemorySurface};
pub use value::CellValue;
pub use virtualizer::{CellWindow, Virtualizer, VisibleRange};

/// One-time runtime setup for browser hosts.
///
/// Installs the panic hook so Rust panics show up in the browser console.
/// Nothing runs on module load; hosts call this once at startup.
#[wasm_bindgen]
pub fn init_grid() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
