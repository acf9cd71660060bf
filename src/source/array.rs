//! In-memory reference data source.

use std::collections::HashMap;

use serde_json::Value;

use super::{DataSource, WriteAck};
use crate::error::{GridError, Result};
use crate::value::CellValue;

/// Rows stored as key → value maps, plus an explicit column key list.
#[derive(Debug, Clone, Default)]
pub struct ArrayDataSource {
    columns: Vec<String>,
    rows: Vec<HashMap<String, CellValue>>,
}

impl ArrayDataSource {
    pub fn new(columns: Vec<String>, rows: Vec<HashMap<String, CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Build a source with `row_count` empty rows.
    pub fn with_rows(columns: Vec<String>, row_count: usize) -> Self {
        Self {
            columns,
            rows: vec![HashMap::new(); row_count],
        }
    }

    /// Parse a JSON array of objects.
    ///
    /// Column order is taken from `columns` when given; otherwise keys are
    /// collected row by row as they first appear (sorted within an object,
    /// since `serde_json` maps are ordered). Nested arrays/objects are kept as
    /// their JSON text.
    pub fn from_json(json: &str, columns: Option<Vec<String>>) -> Result<Self> {
        let parsed: Vec<serde_json::Map<String, Value>> = serde_json::from_str(json)
            .map_err(|e| GridError::InvalidConfig(format!("row data: {e}")))?;

        let columns = columns.unwrap_or_else(|| {
            let mut keys: Vec<String> = Vec::new();
            for obj in &parsed {
                for key in obj.keys() {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
            }
            keys
        });

        let rows = parsed
            .into_iter()
            .map(|obj| {
                obj.into_iter()
                    .map(|(k, v)| (k, json_to_value(v)))
                    .collect::<HashMap<_, _>>()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Append a row.
    pub fn push_row(&mut self, row: HashMap<String, CellValue>) {
        self.rows.push(row);
    }

    /// Insert a row before `index` (`index == row_count` appends).
    pub fn insert_row(&mut self, index: usize, row: HashMap<String, CellValue>) -> Result<()> {
        if index > self.rows.len() {
            return Err(GridError::RowOutOfRange {
                row: index,
                row_count: self.rows.len(),
            });
        }
        self.rows.insert(index, row);
        Ok(())
    }

    /// Remove and return the row at `index`.
    pub fn remove_row(&mut self, index: usize) -> Result<HashMap<String, CellValue>> {
        GridError::check_row(index, self.rows.len())?;
        Ok(self.rows.remove(index))
    }

    fn check_key(&self, key: &str) -> Result<()> {
        if self.columns.iter().any(|c| c == key) {
            Ok(())
        } else {
            Err(GridError::UnknownColumn(key.to_string()))
        }
    }
}

fn json_to_value(v: Value) -> CellValue {
    match v {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| CellValue::Text(n.to_string()), CellValue::Number),
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}

impl DataSource for ArrayDataSource {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn column_keys(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn value(&self, row: usize, key: &str) -> Result<CellValue> {
        self.check_key(key)?;
        let cells = self.rows.get(row).ok_or(GridError::RowOutOfRange {
            row,
            row_count: self.rows.len(),
        })?;
        Ok(cells.get(key).cloned().unwrap_or_default())
    }

    fn set_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<WriteAck> {
        self.check_key(key)?;
        let row_count = self.rows.len();
        let cells = self
            .rows
            .get_mut(row)
            .ok_or(GridError::RowOutOfRange { row, row_count })?;
        if value.is_empty() {
            cells.remove(key);
        } else {
            cells.insert(key.to_string(), value);
        }
        Ok(WriteAck::Applied)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_read_write() {
        let mut src = ArrayDataSource::with_rows(keys(&["A", "B"]), 3);
        assert_eq!(src.row_count(), 3);
        assert_eq!(src.value(1, "A").unwrap(), CellValue::Empty);

        let ack = src.set_value(1, "A", CellValue::from("x")).unwrap();
        assert_eq!(ack, WriteAck::Applied);
        assert_eq!(src.value(1, "A").unwrap(), CellValue::from("x"));

        src.set_value(1, "A", CellValue::Empty).unwrap();
        assert_eq!(src.value(1, "A").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_contract_violations() {
        let mut src = ArrayDataSource::with_rows(keys(&["A"]), 2);
        assert_eq!(
            src.value(2, "A"),
            Err(GridError::RowOutOfRange {
                row: 2,
                row_count: 2
            })
        );
        assert_eq!(
            src.value(0, "Z"),
            Err(GridError::UnknownColumn("Z".into()))
        );
        assert!(src.set_value(5, "A", CellValue::Number(1.0)).is_err());
    }

    #[test]
    fn test_from_json_infers_columns() {
        let src = ArrayDataSource::from_json(
            r#"[{"name": "a", "qty": 2}, {"name": "b", "note": null, "tags": [1]}]"#,
            None,
        )
        .unwrap();
        assert_eq!(src.columns(), &keys(&["name", "qty", "note", "tags"])[..]);
        assert_eq!(src.value(0, "qty").unwrap(), CellValue::Number(2.0));
        assert_eq!(src.value(1, "note").unwrap(), CellValue::Empty);
        assert_eq!(src.value(1, "tags").unwrap(), CellValue::from("[1]"));
        assert_eq!(src.value(1, "qty").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_insert_remove_rows() {
        let mut src = ArrayDataSource::with_rows(keys(&["A"]), 1);
        let mut row = HashMap::new();
        row.insert("A".to_string(), CellValue::Number(7.0));
        src.insert_row(0, row).unwrap();
        assert_eq!(src.row_count(), 2);
        assert_eq!(src.value(0, "A").unwrap(), CellValue::Number(7.0));

        let removed = src.remove_row(0).unwrap();
        assert_eq!(removed["A"], CellValue::Number(7.0));
        assert!(src.insert_row(9, HashMap::new()).is_err());
    }
}
