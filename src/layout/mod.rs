//! Layout engine for computing cell positions and viewport management.
//!
//! This module handles:
//! - Cumulative offset tables for rows and columns of mixed sizes
//! - Suffix-only offset patching when a single size changes
//! - Binary search for efficient cell lookup at grid coordinates
//! - Viewport state (scroll position, size)

mod axis;
mod columns;
mod grid_layout;
mod viewport;

pub(crate) use axis::check_size;
pub use axis::AxisLayout;
pub use columns::{Column, ColumnSet};
pub use grid_layout::{CellRect, GridLayout, DEFAULT_COL_WIDTH, DEFAULT_ROW_HEIGHT};
pub use viewport::Viewport;
