//! Column definitions in display order.

use std::collections::HashMap;

use crate::error::{GridError, Result};

/// A single column. Its display index is its position in the [`ColumnSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub key: String,
    pub width: f64,
    pub min_width: f64,
}

/// Ordered columns with key lookup.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
    index: HashMap<String, usize>,
}

impl ColumnSet {
    /// Build columns for `keys`, using `widths` overrides or `default_width`.
    /// Every width is clamped up to `min_width`.
    pub fn new(
        keys: &[String],
        default_width: f64,
        min_width: f64,
        widths: &HashMap<String, f64>,
    ) -> Self {
        let columns = keys
            .iter()
            .map(|key| Column {
                key: key.clone(),
                width: widths
                    .get(key)
                    .copied()
                    .unwrap_or(default_width)
                    .max(min_width),
                min_width,
            })
            .collect();
        let mut set = Self {
            columns,
            index: HashMap::new(),
        };
        set.reindex();
        set
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }

    pub fn get(&self, display_index: usize) -> Option<&Column> {
        self.columns.get(display_index)
    }

    /// Display index of `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Display index of `key`, or `UnknownColumn`.
    pub fn require(&self, key: &str) -> Result<usize> {
        self.position(key)
            .ok_or_else(|| GridError::UnknownColumn(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.key.as_str())
    }

    pub fn widths(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.width).collect()
    }

    /// Set a column width, clamped to its minimum. Returns the applied width.
    pub fn set_width(&mut self, key: &str, width: f64) -> Result<f64> {
        let idx = self.require(key)?;
        let column = self
            .columns
            .get_mut(idx)
            .ok_or_else(|| GridError::UnknownColumn(key.to_string()))?;
        column.width = width.max(column.min_width);
        Ok(column.width)
    }

    /// Move the column at display index `from` to `to`.
    pub fn move_column(&mut self, from: usize, to: usize) -> Result<()> {
        let count = self.columns.len();
        for index in [from, to] {
            if index >= count {
                return Err(GridError::ColumnOutOfRange { index, count });
            }
        }
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
        self.reindex();
        Ok(())
    }

    /// Follow the data source's key list.
    ///
    /// Only membership matters: surviving columns keep their display order
    /// and width, removed keys are dropped and new keys are appended in
    /// source order, sized from `overrides` or `default_width`.
    ///
    /// Returns `true` when the set changed.
    pub fn sync_keys(
        &mut self,
        keys: &[String],
        default_width: f64,
        min_width: f64,
        overrides: &HashMap<String, f64>,
    ) -> bool {
        let same_members =
            keys.len() == self.columns.len() && keys.iter().all(|k| self.index.contains_key(k));
        if same_members {
            return false;
        }
        self.columns.retain(|c| keys.contains(&c.key));
        for key in keys {
            if self.columns.iter().any(|c| &c.key == key) {
                continue;
            }
            let width = overrides.get(key).copied().unwrap_or(default_width);
            self.columns.push(Column {
                key: key.clone(),
                width: width.max(min_width),
                min_width,
            });
        }
        self.reindex();
        true
    }

    fn reindex(&mut self) {
        self.index = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_widths_and_min_clamp() {
        let mut widths = HashMap::new();
        widths.insert("B".to_string(), 150.0);
        widths.insert("C".to_string(), 4.0);
        let set = ColumnSet::new(&keys(&["A", "B", "C"]), 100.0, 16.0, &widths);
        assert_eq!(set.widths(), vec![100.0, 150.0, 16.0]);
        assert_eq!(set.position("C"), Some(2));
        assert!(set.require("Z").is_err());
    }

    #[test]
    fn test_set_width_clamps() {
        let mut set = ColumnSet::new(&keys(&["A"]), 100.0, 20.0, &HashMap::new());
        assert_eq!(set.set_width("A", 5.0).unwrap(), 20.0);
        assert_eq!(set.set_width("A", 250.0).unwrap(), 250.0);
        assert_eq!(
            set.set_width("Q", 1.0),
            Err(GridError::UnknownColumn("Q".into()))
        );
    }

    #[test]
    fn test_move_column() {
        let mut set = ColumnSet::new(&keys(&["A", "B", "C"]), 10.0, 1.0, &HashMap::new());
        set.move_column(0, 2).unwrap();
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["B", "C", "A"]);
        assert_eq!(set.position("A"), Some(2));
        assert!(set.move_column(0, 3).is_err());
    }

    #[test]
    fn test_sync_keys_keeps_widths() {
        let none = HashMap::new();
        let mut set = ColumnSet::new(&keys(&["A", "B"]), 100.0, 10.0, &none);
        set.set_width("B", 42.0).unwrap();
        assert!(!set.sync_keys(&keys(&["A", "B"]), 100.0, 10.0, &none));
        assert!(set.sync_keys(&keys(&["B", "C"]), 100.0, 10.0, &none));
        assert_eq!(set.widths(), vec![42.0, 100.0]);
        assert_eq!(set.position("A"), None);
    }

    #[test]
    fn test_sync_keys_preserves_display_order() {
        let none = HashMap::new();
        let source_order = keys(&["A", "B", "C"]);
        let mut set = ColumnSet::new(&source_order, 100.0, 10.0, &none);
        set.move_column(0, 2).unwrap();

        assert!(!set.sync_keys(&source_order, 100.0, 10.0, &none));
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["B", "C", "A"]);

        assert!(set.sync_keys(&keys(&["A", "B", "C", "D"]), 100.0, 10.0, &none));
        assert_eq!(set.keys().collect::<Vec<_>>(), vec!["B", "C", "A", "D"]);
        assert_eq!(set.position("D"), Some(3));
    }

    #[test]
    fn test_sync_keys_applies_overrides_to_new_keys() {
        let overrides = HashMap::from([("X".to_string(), 240.0), ("A".to_string(), 5.0)]);
        let mut set = ColumnSet::new(&keys(&["A"]), 100.0, 10.0, &HashMap::new());
        set.set_width("A", 60.0).unwrap();

        assert!(set.sync_keys(&keys(&["A", "X", "Y"]), 100.0, 10.0, &overrides));
        assert_eq!(set.widths(), vec![60.0, 240.0, 100.0]);
    }
}
