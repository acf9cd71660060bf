//! Data source backed by a JavaScript object.
//!
//! Any object with `rowCount()`, `columnKeys()`, `getValue(row, key)` and
//! `setValue(row, key, value)` works. `setValue` may return:
//! - `true` or `undefined`: applied
//! - `false`: rejected, nothing applied
//! - a `Promise`: applied optimistically, settled when the promise does

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Promise, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{GridError, Result};
use crate::source::{DataSource, WriteAck};
use crate::value::CellValue;

/// Slot holding the promise returned by the latest deferred `setValue`.
/// The table takes it right after the commit that produced it.
pub(crate) type DeferredSlot = Rc<RefCell<Option<Promise>>>;

pub(crate) struct JsDataSource {
    target: JsValue,
    row_count: Function,
    column_keys: Function,
    get_value: Function,
    set_value: Function,
    deferred: DeferredSlot,
}

impl JsDataSource {
    pub(crate) fn new(target: JsValue, deferred: DeferredSlot) -> Result<Self> {
        if !target.is_object() {
            return Err(GridError::InvalidConfig(
                "dataSource must be an object".to_string(),
            ));
        }
        Ok(Self {
            row_count: method(&target, "rowCount")?,
            column_keys: method(&target, "columnKeys")?,
            get_value: method(&target, "getValue")?,
            set_value: method(&target, "setValue")?,
            target,
            deferred,
        })
    }

    fn call_set_value(&self, row: usize, key: &str, value: &CellValue) -> Result<JsValue> {
        self.set_value
            .call3(
                &self.target,
                &index_to_js(row),
                &JsValue::from_str(key),
                &cell_to_js(value),
            )
            .map_err(|e| GridError::Host(describe_js_error(&e)))
    }
}

fn method(target: &JsValue, name: &str) -> Result<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| GridError::InvalidConfig(format!("dataSource.{name} is not a function")))
}

impl DataSource for JsDataSource {
    fn row_count(&self) -> usize {
        match self.row_count.call0(&self.target) {
            Ok(n) => n.as_f64().map_or(0, js_to_index),
            Err(e) => {
                tracing::warn!("dataSource.rowCount threw: {}", describe_js_error(&e));
                0
            }
        }
    }

    fn column_keys(&self) -> Vec<String> {
        match self.column_keys.call0(&self.target) {
            Ok(keys) => Array::from(&keys)
                .iter()
                .filter_map(|k| k.as_string())
                .collect(),
            Err(e) => {
                tracing::warn!("dataSource.columnKeys threw: {}", describe_js_error(&e));
                Vec::new()
            }
        }
    }

    fn value(&self, row: usize, key: &str) -> Result<CellValue> {
        self.get_value
            .call2(&self.target, &index_to_js(row), &JsValue::from_str(key))
            .map(|v| cell_from_js(&v))
            .map_err(|e| GridError::Host(describe_js_error(&e)))
    }

    fn set_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<WriteAck> {
        let ack = self.call_set_value(row, key, &value)?;
        if let Some(promise) = ack.dyn_ref::<Promise>() {
            *self.deferred.borrow_mut() = Some(promise.clone());
            return Ok(WriteAck::Deferred);
        }
        if ack.as_bool() == Some(false) {
            return Ok(WriteAck::Rejected(format!(
                "dataSource.setValue refused row {row}, column {key}"
            )));
        }
        Ok(WriteAck::Applied)
    }

    fn restore_value(&mut self, row: usize, key: &str, value: CellValue) -> Result<()> {
        // A promise returned here is not tracked.
        self.call_set_value(row, key, &value).map(|_| ())
    }
}

/// JS value → cell value. Objects and other exotic values become text.
pub(crate) fn cell_from_js(value: &JsValue) -> CellValue {
    if value.is_null() || value.is_undefined() {
        CellValue::Empty
    } else if let Some(b) = value.as_bool() {
        CellValue::Bool(b)
    } else if let Some(n) = value.as_f64() {
        CellValue::Number(n)
    } else if let Some(s) = value.as_string() {
        CellValue::Text(s)
    } else {
        let json = js_sys::JSON::stringify(value).ok().map(String::from);
        CellValue::Text(json.unwrap_or_default())
    }
}

/// Cell value → JS value (`Empty` maps to `null`).
pub(crate) fn cell_to_js(value: &CellValue) -> JsValue {
    match value {
        CellValue::Empty => JsValue::NULL,
        CellValue::Bool(b) => JsValue::from_bool(*b),
        CellValue::Number(n) => JsValue::from_f64(*n),
        CellValue::Text(s) => JsValue::from_str(s),
    }
}

/// Message of a thrown JS value.
pub(crate) fn describe_js_error(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

#[allow(clippy::cast_precision_loss)]
fn index_to_js(index: usize) -> JsValue {
    JsValue::from_f64(index as f64)
}

/// Convert a JS number to an index, clamping negatives and NaN to 0.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn js_to_index(v: f64) -> usize {
    if v.is_nan() {
        return 0;
    }
    v.clamp(0.0, f64::from(u32::MAX)).floor() as usize
}
