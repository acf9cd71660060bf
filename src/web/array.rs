//! `ArrayDataSource` exported to JavaScript.
//!
//! Exposes the same `rowCount`/`columnKeys`/`getValue`/`setValue` methods a
//! hand-written JS data source has, so `Table` drives it through the same
//! path.

use std::collections::HashMap;

use js_sys::{Array, Object};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::source::{cell_from_js, cell_to_js};
use crate::error::GridError;
use crate::source::{ArrayDataSource, DataSource};
use crate::value::CellValue;

#[wasm_bindgen(js_name = ArrayDataSource)]
pub struct JsArrayDataSource {
    inner: ArrayDataSource,
}

#[wasm_bindgen(js_class = ArrayDataSource)]
impl JsArrayDataSource {
    /// `new ArrayDataSource(columns, rows?)` where `rows` is an array of
    /// plain objects keyed by column.
    #[wasm_bindgen(constructor)]
    pub fn new(columns: Vec<String>, rows: JsValue) -> Result<JsArrayDataSource, JsValue> {
        let rows = if rows.is_undefined() || rows.is_null() {
            Vec::new()
        } else if Array::is_array(&rows) {
            Array::from(&rows).iter().map(|r| row_from_js(&r)).collect()
        } else {
            return Err(GridError::InvalidConfig("rows must be an array".to_string()).into());
        };
        Ok(Self {
            inner: ArrayDataSource::new(columns, rows),
        })
    }

    /// Parse rows from a JSON string (array of objects).
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<JsArrayDataSource, JsValue> {
        Ok(Self {
            inner: ArrayDataSource::from_json(json, None)?,
        })
    }

    #[wasm_bindgen(js_name = rowCount)]
    pub fn row_count(&self) -> usize {
        self.inner.row_count()
    }

    #[wasm_bindgen(js_name = columnKeys)]
    pub fn column_keys(&self) -> Vec<String> {
        self.inner.column_keys()
    }

    #[wasm_bindgen(js_name = getValue)]
    pub fn get_value(&self, row: usize, key: &str) -> Result<JsValue, JsValue> {
        Ok(cell_to_js(&self.inner.value(row, key)?))
    }

    /// Always applies synchronously.
    #[wasm_bindgen(js_name = setValue)]
    pub fn set_value(&mut self, row: usize, key: &str, value: JsValue) -> Result<bool, JsValue> {
        self.inner.set_value(row, key, cell_from_js(&value))?;
        Ok(true)
    }

    #[wasm_bindgen(js_name = pushRow)]
    pub fn push_row(&mut self, row: JsValue) {
        self.inner.push_row(row_from_js(&row));
    }

    #[wasm_bindgen(js_name = insertRow)]
    pub fn insert_row(&mut self, index: usize, row: JsValue) -> Result<(), JsValue> {
        Ok(self.inner.insert_row(index, row_from_js(&row))?)
    }

    #[wasm_bindgen(js_name = removeRow)]
    pub fn remove_row(&mut self, index: usize) -> Result<(), JsValue> {
        self.inner.remove_row(index)?;
        Ok(())
    }
}

fn row_from_js(row: &JsValue) -> HashMap<String, CellValue> {
    let Some(obj) = row.dyn_ref::<Object>() else {
        return HashMap::new();
    };
    Object::entries(obj)
        .iter()
        .filter_map(|entry| {
            let pair = Array::from(&entry);
            let key = pair.get(0).as_string()?;
            let value = cell_from_js(&pair.get(1));
            (!value.is_empty()).then_some((key, value))
        })
        .collect()
}
