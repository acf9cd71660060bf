//! Offset table for one axis (rows or columns).
//!
//! `offsets[i]` is the leading edge of item `i`; the table carries one extra
//! entry for the trailing edge, so `offsets.len() == sizes.len() + 1` and
//! `offsets[i + 1] == offsets[i] + sizes[i]` always holds.

use std::collections::HashMap;

use crate::error::{GridError, Result};

/// Sizes and cumulative offsets along a single axis.
#[derive(Debug, Clone)]
pub struct AxisLayout {
    sizes: Vec<f64>,
    offsets: Vec<f64>,
    default_size: f64,
}

/// Validate a pixel size for `axis` ("row" / "column").
pub(crate) fn check_size(axis: &'static str, size: f64) -> Result<f64> {
    if size.is_finite() && size > 0.0 {
        Ok(size)
    } else {
        Err(GridError::InvalidSize { axis, size })
    }
}

impl AxisLayout {
    /// Build an axis of `count` items. Items without an override get
    /// `default_size`.
    pub fn new(count: usize, default_size: f64, overrides: &HashMap<usize, f64>) -> Self {
        let mut sizes = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count + 1);
        let mut pos = 0.0;
        for i in 0..count {
            offsets.push(pos);
            let size = overrides.get(&i).copied().unwrap_or(default_size);
            sizes.push(size);
            pos += size;
        }
        offsets.push(pos);
        Self {
            sizes,
            offsets,
            default_size,
        }
    }

    /// Build an axis from explicit sizes.
    pub fn from_sizes(sizes: Vec<f64>, default_size: f64) -> Self {
        let mut layout = Self {
            offsets: vec![0.0; sizes.len() + 1],
            sizes,
            default_size,
        };
        layout.patch_from(0);
        layout
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn default_size(&self) -> f64 {
        self.default_size
    }

    /// Leading edge of item `index`. `index == len()` yields the total extent.
    pub fn offset(&self, index: usize) -> Option<f64> {
        self.offsets.get(index).copied()
    }

    pub fn size(&self, index: usize) -> Option<f64> {
        self.sizes.get(index).copied()
    }

    pub fn sizes(&self) -> &[f64] {
        &self.sizes
    }

    pub fn offsets(&self) -> &[f64] {
        &self.offsets
    }

    /// Total extent of the axis.
    pub fn total(&self) -> f64 {
        self.offsets.last().copied().unwrap_or(0.0)
    }

    /// Index of the item whose span `[offset, offset + size)` contains `pos`.
    ///
    /// Positions before the first item clamp to 0 and positions at or past the
    /// end clamp to the last item. `None` only for an empty axis.
    pub fn index_at(&self, pos: f64) -> Option<usize> {
        if self.sizes.is_empty() {
            return None;
        }
        // Number of leading edges <= pos; the item is the one just before.
        let edges = self
            .offsets
            .get(..self.sizes.len())
            .map_or(0, |leading| leading.partition_point(|&o| o <= pos));
        Some(edges.saturating_sub(1).min(self.sizes.len() - 1))
    }

    /// Change one item's size, recomputing only the offsets after it.
    ///
    /// Returns `false` when `index` is out of range.
    pub fn set_size(&mut self, index: usize, size: f64) -> bool {
        let Some(slot) = self.sizes.get_mut(index) else {
            return false;
        };
        if (*slot - size).abs() > f64::EPSILON {
            *slot = size;
            self.patch_from(index);
        }
        true
    }

    /// Grow or shrink the axis to `count` items. Surviving items keep their
    /// sizes; new items get the default size.
    pub fn resize(&mut self, count: usize) {
        let old = self.sizes.len();
        if count == old {
            return;
        }
        self.sizes.resize(count, self.default_size);
        self.offsets.resize(count + 1, 0.0);
        self.patch_from(old.min(count));
    }

    /// Insert an item of `size` before `index`.
    pub fn insert(&mut self, index: usize, size: f64) {
        let index = index.min(self.sizes.len());
        self.sizes.insert(index, size);
        self.offsets.push(0.0);
        self.patch_from(index);
    }

    /// Remove the item at `index`, returning its size.
    pub fn remove(&mut self, index: usize) -> Option<f64> {
        if index >= self.sizes.len() {
            return None;
        }
        let size = self.sizes.remove(index);
        self.offsets.pop();
        self.patch_from(index);
        Some(size)
    }

    /// Move the item at `from` so it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) {
        if from >= self.sizes.len() || to >= self.sizes.len() || from == to {
            return;
        }
        let size = self.sizes.remove(from);
        self.sizes.insert(to, size);
        self.patch_from(from.min(to));
    }

    /// Recompute `offsets[start + 1..]` from `offsets[start]`.
    fn patch_from(&mut self, start: usize) {
        let mut pos = self.offsets.get(start).copied().unwrap_or(0.0);
        let tail_sizes = self.sizes.get(start..).unwrap_or(&[]);
        let tail_offsets = self.offsets.get_mut(start + 1..).unwrap_or(&mut []);
        for (size, offset) in tail_sizes.iter().zip(tail_offsets.iter_mut()) {
            pos += size;
            *offset = pos;
        }
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

    fn assert_prefix_sums(axis: &AxisLayout) {
        let mut sum = 0.0;
        for i in 0..axis.len() {
            assert_eq!(axis.offset(i).unwrap(), sum, "offset {i}");
            sum += axis.size(i).unwrap();
        }
        assert_eq!(axis.total(), sum);
        assert_eq!(axis.offsets().len(), axis.len() + 1);
    }

    #[test]
    fn test_uniform_axis() {
        let axis = AxisLayout::new(20, 28.0, &HashMap::new());
        assert_eq!(axis.len(), 20);
        assert_eq!(axis.total(), 560.0);
        assert_eq!(axis.offset(10), Some(280.0));
        assert_prefix_sums(&axis);
    }

    #[test]
    fn test_overrides() {
        let mut overrides = HashMap::new();
        overrides.insert(1, 50.0);
        let axis = AxisLayout::new(3, 20.0, &overrides);
        assert_eq!(axis.sizes(), &[20.0, 50.0, 20.0]);
        assert_eq!(axis.offsets(), &[0.0, 20.0, 70.0, 90.0]);
    }

    #[test]
    fn test_index_at() {
        let axis = AxisLayout::from_sizes(vec![10.0, 30.0, 20.0], 10.0);
        assert_eq!(axis.index_at(-5.0), Some(0));
        assert_eq!(axis.index_at(0.0), Some(0));
        assert_eq!(axis.index_at(9.9), Some(0));
        assert_eq!(axis.index_at(10.0), Some(1));
        assert_eq!(axis.index_at(39.0), Some(1));
        assert_eq!(axis.index_at(40.0), Some(2));
        assert_eq!(axis.index_at(60.0), Some(2));
        assert_eq!(axis.index_at(1000.0), Some(2));
        assert_eq!(AxisLayout::from_sizes(Vec::new(), 1.0).index_at(0.0), None);
    }

    #[test]
    fn test_set_size_patches_suffix() {
        let mut axis = AxisLayout::new(100, 20.0, &HashMap::new());
        assert!(axis.set_size(40, 55.0));
        assert_eq!(axis.offset(40), Some(800.0));
        assert_eq!(axis.offset(41), Some(855.0));
        assert_eq!(axis.total(), 2035.0);
        assert_prefix_sums(&axis);

        assert!(axis.set_size(0, 1.0));
        assert_prefix_sums(&axis);
        assert!(!axis.set_size(100, 1.0));
    }

    #[test]
    fn test_resize_insert_remove() {
        let mut axis = AxisLayout::from_sizes(vec![10.0, 20.0], 5.0);
        axis.resize(4);
        assert_eq!(axis.sizes(), &[10.0, 20.0, 5.0, 5.0]);
        assert_prefix_sums(&axis);

        axis.resize(1);
        assert_eq!(axis.sizes(), &[10.0]);
        assert_eq!(axis.total(), 10.0);

        axis.insert(0, 7.0);
        assert_eq!(axis.offsets(), &[0.0, 7.0, 17.0]);
        assert_eq!(axis.remove(0), Some(7.0));
        assert_eq!(axis.offsets(), &[0.0, 10.0]);
        assert_eq!(axis.remove(3), None);
    }

    #[test]
    fn test_move_item() {
        let mut axis = AxisLayout::from_sizes(vec![1.0, 2.0, 3.0, 4.0], 1.0);
        axis.move_item(0, 3);
        assert_eq!(axis.sizes(), &[2.0, 3.0, 4.0, 1.0]);
        assert_prefix_sums(&axis);
        axis.move_item(3, 1);
        assert_eq!(axis.sizes(), &[2.0, 1.0, 3.0, 4.0]);
        assert_prefix_sums(&axis);
    }

    #[test]
    fn test_check_size() {
        assert!(check_size("row", 1.0).is_ok());
        assert!(check_size("row", 0.0).is_err());
        assert!(check_size("row", -3.0).is_err());
        assert!(check_size("column", f64::NAN).is_err());
        assert!(check_size("column", f64::INFINITY).is_err());
    }
}
