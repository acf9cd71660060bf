//! Browser binding.
//!
//! `Table` mounts a [`Grid`] into a host element:
//! - the host becomes the scroll container, cells are divs inside it
//! - scroll, double-click, input, keydown and focusout are delegated to the host
//! - a `ResizeObserver` keeps the viewport size current
//! - committed changes go to `subscribe`d callbacks and to a `cellchange`
//!   `CustomEvent` on the host
//!
//! JS callbacks run only after the grid borrow is released, so a listener
//! may call back into the table.

mod array;
mod resize;
mod source;
mod surface;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Function, Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CustomEvent, CustomEventInit, Event, HtmlElement, HtmlInputElement, KeyboardEvent};

use crate::config::GridConfig;
use crate::editor::input::EDITOR_CLASS;
use crate::editor::{CommitOutcome, CommitTicket, EditStatus};
use crate::error::{GridError, Result};
use crate::events::CellChange;
use crate::grid::Grid;
use crate::source::SharedSource;
use crate::value::CellValue;

pub use array::JsArrayDataSource;

use resize::DomResizeObserver;
use source::{describe_js_error, DeferredSlot, JsDataSource};
use surface::{DomSurface, CELL_CLASS};

/// Name of the DOM event fired on the host after a committed change.
pub const CELL_CHANGE_EVENT: &str = "cellchange";

/// State reachable from event handlers and async settlements.
struct Shared {
    grid: RefCell<Grid<DomSurface>>,
    host: HtmlElement,
    /// Changes dispatched by the grid, waiting for delivery to JS.
    outbox: Rc<RefCell<Vec<CellChange>>>,
    deferred: DeferredSlot,
    listeners: RefCell<Vec<(u32, Function)>>,
    next_listener: RefCell<u32>,
}

impl Shared {
    /// Run `op` against the grid, then deliver whatever it produced.
    fn with_grid<T>(
        self: &Rc<Self>,
        op: impl FnOnce(&mut Grid<DomSurface>) -> Result<T>,
    ) -> Result<T> {
        let result = {
            let mut grid = self
                .grid
                .try_borrow_mut()
                .map_err(|_| GridError::Host("grid is busy".to_string()))?;
            op(&mut grid)
        };
        self.flush();
        result
    }

    /// Like `with_grid`, for event handlers: skips when the grid is already
    /// borrowed (a handler re-entered from a DOM call) and logs failures.
    fn handle(self: &Rc<Self>, what: &str, op: impl FnOnce(&mut Grid<DomSurface>) -> Result<()>) {
        let result = {
            let Ok(mut grid) = self.grid.try_borrow_mut() else {
                return;
            };
            op(&mut grid)
        };
        self.flush();
        if let Err(err) = result {
            tracing::warn!("{what} failed: {err}");
        }
    }

    /// Start settlement for a commit the data source deferred.
    fn track(self: &Rc<Self>, outcome: &CommitOutcome) {
        let CommitOutcome::Pending { ticket, .. } = outcome else {
            return;
        };
        let Some(promise) = self.deferred.borrow_mut().take() else {
            tracing::warn!(ticket = ticket.as_u32(), "deferred commit without a promise");
            return;
        };
        settle_later(Rc::clone(self), *ticket, promise);
    }

    /// Deliver queued change events to JS.
    fn flush(&self) {
        loop {
            let changes = std::mem::take(&mut *self.outbox.borrow_mut());
            if changes.is_empty() {
                return;
            }
            for change in &changes {
                self.deliver(change);
            }
        }
    }

    fn deliver(&self, change: &CellChange) {
        let detail = match change.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        {
            Ok(detail) => detail,
            Err(err) => {
                tracing::warn!("could not serialize change event: {err}");
                return;
            }
        };

        // Listeners may subscribe/unsubscribe while being called.
        let listeners: Vec<Function> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| f.clone())
            .collect();
        for listener in listeners {
            if let Err(err) = listener.call1(&JsValue::NULL, &detail) {
                tracing::warn!("change listener threw: {}", describe_js_error(&err));
            }
        }

        let init = CustomEventInit::new();
        init.set_detail(&detail);
        init.set_bubbles(true);
        match CustomEvent::new_with_event_init_dict(CELL_CHANGE_EVENT, &init) {
            Ok(event) => {
                let _ = self.host.dispatch_event(&event);
            }
            Err(err) => tracing::warn!("could not create event: {}", describe_js_error(&err)),
        }
    }
}

fn settle_later(shared: Rc<Shared>, ticket: CommitTicket, promise: Promise) {
    wasm_bindgen_futures::spawn_local(async move {
        let result = match JsFuture::from(promise).await {
            Ok(v) if v.as_bool() == Some(false) => Err("write rejected by data source".to_string()),
            Ok(_) => Ok(()),
            Err(err) => Err(describe_js_error(&err)),
        };
        match shared.with_grid(|grid| grid.settle_commit(ticket, result)) {
            Ok(Some(CommitOutcome::Reverted { change, reason })) => {
                tracing::debug!(row = change.row, column = %change.column, "reverted: {reason}");
            }
            Ok(_) => {}
            Err(GridError::Disposed) => {}
            Err(err) => tracing::warn!("settling commit failed: {err}"),
        }
    });
}

/// Read `scrollLeft`/`scrollTop` as fractional values when the browser has them.
fn scroll_position(el: &HtmlElement) -> (f64, f64) {
    let read = |name: &str, fallback: i32| {
        Reflect::get(el.as_ref(), &JsValue::from_str(name))
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| f64::from(fallback))
    };
    (
        read("scrollLeft", el.scroll_left()),
        read("scrollTop", el.scroll_top()),
    )
}

/// `(row, column)` of the cell div an event targeted.
fn event_cell(event: &Event) -> Option<(usize, String)> {
    let target = event.target()?.dyn_into::<web_sys::Element>().ok()?;
    let cell = target
        .closest(&format!(".{CELL_CLASS}"))
        .ok()??
        .dyn_into::<HtmlElement>()
        .ok()?;
    let dataset = cell.dataset();
    let row = dataset.get("row")?.parse().ok()?;
    Some((row, dataset.get("col")?))
}

/// The inline editor, if it is the event's target.
fn editor_target(event: &Event) -> Option<HtmlInputElement> {
    event
        .target()?
        .dyn_into::<HtmlInputElement>()
        .ok()
        .filter(|input| input.class_name() == EDITOR_CLASS)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WindowInfo {
    first_row: usize,
    last_row: usize,
    first_col: usize,
    last_col: usize,
}

#[derive(Serialize)]
struct EditingCell<'a> {
    row: usize,
    column: &'a str,
}

fn status_name(status: EditStatus) -> &'static str {
    match status {
        EditStatus::Started => "started",
        EditStatus::AlreadyEditing => "alreadyEditing",
        EditStatus::Queued => "queued",
        EditStatus::NotVisible => "notVisible",
    }
}

fn outcome_name(outcome: &CommitOutcome) -> &'static str {
    match outcome {
        CommitOutcome::NoSession => "noSession",
        CommitOutcome::Committed(_) => "committed",
        CommitOutcome::Pending { .. } => "pending",
        CommitOutcome::Reverted { .. } => "reverted",
    }
}

type Listener = Closure<dyn FnMut(Event)>;

/// A virtualized, editable table mounted in a host element.
#[wasm_bindgen]
pub struct Table {
    shared: Rc<Shared>,
    closures: Vec<(&'static str, Listener)>,
    observer: Option<DomResizeObserver>,
}

#[wasm_bindgen]
impl Table {
    /// Mount a table into `host`.
    ///
    /// `config.dataSource` is required; the remaining keys follow
    /// `GridConfig` (`defaultRowHeight`, `defaultColumnWidth`,
    /// `minColumnWidth`, `overscan`, `rowHeights`, `columnWidths`).
    #[wasm_bindgen(constructor)]
    pub fn new(host: HtmlElement, config: JsValue) -> std::result::Result<Table, JsValue> {
        let data_source = Reflect::get(&config, &JsValue::from_str("dataSource"))
            .ok()
            .filter(|v| !v.is_undefined() && !v.is_null())
            .ok_or_else(|| GridError::InvalidConfig("config.dataSource is required".to_string()))?;
        let grid_config = parse_config(&config)?;

        let deferred: DeferredSlot = Rc::new(RefCell::new(None));
        let source: SharedSource = Rc::new(RefCell::new(JsDataSource::new(
            data_source,
            Rc::clone(&deferred),
        )?));
        let surface = DomSurface::attach(&host)?;
        let mut grid = Grid::new(source, grid_config, surface)?;

        let outbox: Rc<RefCell<Vec<CellChange>>> = Rc::new(RefCell::new(Vec::new()));
        {
            let outbox = Rc::clone(&outbox);
            grid.subscribe(move |change| {
                outbox.borrow_mut().push(change.clone());
                Ok(())
            });
        }

        let shared = Rc::new(Shared {
            grid: RefCell::new(grid),
            host,
            outbox,
            deferred,
            listeners: RefCell::new(Vec::new()),
            next_listener: RefCell::new(0),
        });

        let mut table = Table {
            closures: Self::setup_listeners(&shared),
            observer: None,
            shared,
        };
        table.observer = table.setup_resize();

        let host = &table.shared.host;
        let (width, height) = (f64::from(host.client_width()), f64::from(host.client_height()));
        table.shared.with_grid(|grid| {
            grid.observe_size(width, height)?;
            grid.render()
        })?;
        tracing::debug!("table mounted");
        Ok(table)
    }

    /// Run a virtualization pass now.
    pub fn render(&self) -> std::result::Result<(), JsValue> {
        Ok(self.shared.with_grid(Grid::render)?)
    }

    /// Scroll the host and the grid to an absolute position.
    #[wasm_bindgen(js_name = scrollTo)]
    pub fn scroll_to(&self, x: f64, y: f64) -> std::result::Result<(), JsValue> {
        self.shared.with_grid(|grid| grid.scroll_to(x, y))?;
        let (x, y) = {
            let grid = self.shared.grid.borrow();
            (grid.viewport().scroll_x, grid.viewport().scroll_y)
        };
        self.shared.host.set_scroll_left(round_px(x));
        self.shared.host.set_scroll_top(round_px(y));
        Ok(())
    }

    #[wasm_bindgen(js_name = setRowHeight)]
    pub fn set_row_height(&self, row: usize, height: f64) -> std::result::Result<(), JsValue> {
        Ok(self.shared.with_grid(|grid| grid.set_row_height(row, height))?)
    }

    /// Returns the applied width (clamped to the column minimum).
    #[wasm_bindgen(js_name = setColumnWidth)]
    pub fn set_column_width(&self, column: &str, width: f64) -> std::result::Result<f64, JsValue> {
        Ok(self
            .shared
            .with_grid(|grid| grid.set_column_width(column, width))?)
    }

    #[wasm_bindgen(js_name = moveColumn)]
    pub fn move_column(&self, from: usize, to: usize) -> std::result::Result<(), JsValue> {
        Ok(self.shared.with_grid(|grid| grid.move_column(from, to))?)
    }

    /// Pick up rows/columns the host added or removed.
    pub fn refresh(&self) -> std::result::Result<(), JsValue> {
        Ok(self.shared.with_grid(Grid::sync_with_source)?)
    }

    #[wasm_bindgen(js_name = setDataSource)]
    pub fn set_data_source(&self, data_source: JsValue) -> std::result::Result<(), JsValue> {
        let source: SharedSource = Rc::new(RefCell::new(JsDataSource::new(
            data_source,
            Rc::clone(&self.shared.deferred),
        )?));
        Ok(self.shared.with_grid(|grid| grid.set_data_source(source))?)
    }

    /// Open the editor on a cell. Returns `"started"`, `"alreadyEditing"`,
    /// `"queued"` or `"notVisible"`.
    #[wasm_bindgen(js_name = beginEdit)]
    pub fn begin_edit(&self, row: usize, column: &str) -> std::result::Result<String, JsValue> {
        let begun = self.shared.with_grid(|grid| grid.begin_edit(row, column))?;
        if let Some(previous) = &begun.previous {
            self.shared.track(previous);
        }
        Ok(status_name(begun.status).to_string())
    }

    #[wasm_bindgen(js_name = updateDraft)]
    pub fn update_draft(&self, value: JsValue) -> std::result::Result<bool, JsValue> {
        let draft = source::cell_from_js(&value);
        Ok(self.shared.with_grid(|grid| grid.update_draft(draft))?)
    }

    /// Commit the open edit. Returns `"noSession"`, `"committed"`,
    /// `"pending"` or `"reverted"`.
    pub fn commit(&self) -> std::result::Result<String, JsValue> {
        let outcome = self.shared.with_grid(Grid::commit_edit)?;
        self.shared.track(&outcome);
        Ok(outcome_name(&outcome).to_string())
    }

    pub fn cancel(&self) -> std::result::Result<bool, JsValue> {
        Ok(self.shared.with_grid(Grid::cancel_edit)?)
    }

    /// `{ row, column }` of the open edit, or `null`.
    #[wasm_bindgen(js_name = editingCell)]
    pub fn editing_cell(&self) -> JsValue {
        let grid = self.shared.grid.borrow();
        grid.editing_cell()
            .and_then(|(row, column)| {
                EditingCell { row, column }
                    .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                    .ok()
            })
            .unwrap_or(JsValue::NULL)
    }

    /// `{ firstRow, lastRow, firstCol, lastCol }` of the materialized
    /// window, or `null`.
    #[wasm_bindgen(js_name = visibleWindow)]
    pub fn visible_window(&self) -> JsValue {
        let Some(window) = self.shared.grid.borrow().window() else {
            return JsValue::NULL;
        };
        let info = WindowInfo {
            first_row: window.rows.first,
            last_row: window.rows.last,
            first_col: window.cols.first,
            last_col: window.cols.last,
        };
        serde_wasm_bindgen::to_value(&info).unwrap_or(JsValue::NULL)
    }

    /// Register `fn(change)` for committed changes. Returns an id for
    /// `unsubscribe`.
    pub fn subscribe(&self, listener: Function) -> u32 {
        let mut next = self.shared.next_listener.borrow_mut();
        let id = *next;
        *next = next.wrapping_add(1);
        self.shared.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: u32) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Tear down: stop observing, remove listeners and cells, release the
    /// data source. Safe to call more than once.
    pub fn dispose(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
        for (name, closure) in self.closures.drain(..) {
            let _ = self
                .shared
                .host
                .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        }
        self.shared.listeners.borrow_mut().clear();
        self.shared.outbox.borrow_mut().clear();
        self.shared.deferred.borrow_mut().take();
        if let Ok(mut grid) = self.shared.grid.try_borrow_mut() {
            if !grid.is_disposed() {
                grid.dispose();
                grid.surface_mut().detach();
            }
        }
    }
}

impl Table {
    fn setup_resize(&self) -> Option<DomResizeObserver> {
        let shared = Rc::clone(&self.shared);
        let observed = DomResizeObserver::observe(&self.shared.host, move |width, height| {
            shared.handle("resize", |grid| grid.observe_size(width, height).map(|_| ()));
        });
        match observed {
            Ok(observer) => Some(observer),
            Err(err) => {
                tracing::warn!("{err}; container size is only read at mount");
                None
            }
        }
    }

    fn setup_listeners(shared: &Rc<Shared>) -> Vec<(&'static str, Listener)> {
        let mut closures: Vec<(&'static str, Listener)> = Vec::new();

        // Scroll: re-virtualize at the host's scroll position.
        {
            let shared = Rc::clone(shared);
            let closure = Closure::wrap(Box::new(move |_e: Event| {
                let (x, y) = scroll_position(&shared.host);
                shared.handle("scroll", |grid| grid.scroll_to(x, y).map(|_| ()));
            }) as Box<dyn FnMut(Event)>);
            closures.push(("scroll", closure));
        }

        // Double-click on a cell opens the editor.
        {
            let shared = Rc::clone(shared);
            let closure = Closure::wrap(Box::new(move |e: Event| {
                let Some((row, column)) = event_cell(&e) else {
                    return;
                };
                let s = Rc::clone(&shared);
                shared.handle("begin edit", move |grid| {
                    let begun = grid.begin_edit(row, &column)?;
                    if let Some(previous) = &begun.previous {
                        s.track(previous);
                    }
                    Ok(())
                });
            }) as Box<dyn FnMut(Event)>);
            closures.push(("dblclick", closure));
        }

        // Typing updates the draft.
        {
            let shared = Rc::clone(shared);
            let closure = Closure::wrap(Box::new(move |e: Event| {
                let Some(input) = editor_target(&e) else {
                    return;
                };
                let draft = CellValue::parse_input(&input.value());
                shared.handle("draft", |grid| grid.update_draft(draft).map(|_| ()));
            }) as Box<dyn FnMut(Event)>);
            closures.push(("input", closure));
        }

        // Enter commits, Escape cancels.
        {
            let shared = Rc::clone(shared);
            let closure = Closure::wrap(Box::new(move |e: Event| {
                if editor_target(&e).is_none() {
                    return;
                }
                let Some(key) = e.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                    return;
                };
                match key.as_str() {
                    "Enter" => {
                        e.prevent_default();
                        let s = Rc::clone(&shared);
                        shared.handle("commit", move |grid| {
                            let outcome = grid.commit_edit()?;
                            s.track(&outcome);
                            Ok(())
                        });
                    }
                    "Escape" => {
                        e.prevent_default();
                        shared.handle("cancel", |grid| grid.cancel_edit().map(|_| ()));
                    }
                    _ => {}
                }
            }) as Box<dyn FnMut(Event)>);
            closures.push(("keydown", closure));
        }

        // Leaving the editor commits.
        {
            let shared = Rc::clone(shared);
            let closure = Closure::wrap(Box::new(move |e: Event| {
                if editor_target(&e).is_none() {
                    return;
                }
                let s = Rc::clone(&shared);
                shared.handle("commit", move |grid| {
                    let outcome = grid.commit_edit()?;
                    s.track(&outcome);
                    Ok(())
                });
            }) as Box<dyn FnMut(Event)>);
            closures.push(("focusout", closure));
        }

        for (name, closure) in &closures {
            shared
                .host
                .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
                .ok();
        }
        closures
    }
}

impl Drop for Table {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Config keys other than `dataSource`, parsed as `GridConfig`.
fn parse_config(config: &JsValue) -> Result<GridConfig> {
    if !config.is_object() {
        return Err(GridError::InvalidConfig(
            "config must be an object".to_string(),
        ));
    }
    let copy = Object::assign(&Object::new(), config.unchecked_ref::<Object>());
    let _ = Reflect::delete_property(&copy, &JsValue::from_str("dataSource"));
    let json = js_sys::JSON::stringify(&copy)
        .map(String::from)
        .map_err(|e| GridError::InvalidConfig(describe_js_error(&e)))?;
    GridConfig::from_json(&json)
}

#[allow(clippy::cast_possible_truncation)]
fn round_px(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}
