//! Grid configuration.
//!
//! Deserialized from the host's options object (camelCase keys). Unknown keys
//! are ignored, so hosts can pass richer option bags through unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::layout::{DEFAULT_COL_WIDTH, DEFAULT_ROW_HEIGHT};
use crate::virtualizer::DEFAULT_OVERSCAN;

/// Smallest width a column can be dragged to, unless configured otherwise.
pub const DEFAULT_MIN_COLUMN_WIDTH: f64 = 16.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    /// Height of rows without an override
    pub default_row_height: f64,
    /// Width of columns without an override
    pub default_column_width: f64,
    /// Lower bound for every column width
    pub min_column_width: f64,
    /// Extra rows/columns materialized on each side of the viewport
    pub overscan: usize,
    /// Per-row height overrides, keyed by row index
    pub row_heights: HashMap<usize, f64>,
    /// Per-column width overrides, keyed by column key
    pub column_widths: HashMap<String, f64>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_column_width: DEFAULT_COL_WIDTH,
            min_column_width: DEFAULT_MIN_COLUMN_WIDTH,
            overscan: DEFAULT_OVERSCAN,
            row_heights: HashMap::new(),
            column_widths: HashMap::new(),
        }
    }
}

impl GridConfig {
    /// Parse a JSON options object.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| GridError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes that would break the layout invariants.
    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(GridError::InvalidConfig(format!(
                    "{name} must be a positive number, got {v}"
                )))
            }
        };
        positive("defaultRowHeight", self.default_row_height)?;
        positive("defaultColumnWidth", self.default_column_width)?;
        positive("minColumnWidth", self.min_column_width)?;
        for (row, height) in &self.row_heights {
            positive(&format!("rowHeights[{row}]"), *height)?;
        }
        for (key, width) in &self.column_widths {
            positive(&format!("columnWidths[{key}]"), *width)?;
        }
        Ok(())
    }
}
