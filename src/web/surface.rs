//! DOM materialization.
//!
//! The host element is the scroll container. A spacer div sized to the full
//! content gives it native scrollbars; every materialized cell is an
//! absolutely positioned div inside the spacer, so cells keep their grid
//! coordinates and the browser does the scrolling.

use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement};

use crate::editor::input::InputOverlay;
use crate::error::{GridError, Result};
use crate::layout::CellRect;
use crate::surface::{CellSurface, CellView};

/// Class of every cell div.
pub(crate) const CELL_CLASS: &str = "vgrid-cell";

pub(crate) struct DomSurface {
    document: Document,
    spacer: HtmlElement,
    cells: HashMap<(usize, String), HtmlElement>,
    editor: InputOverlay,
    editing: Option<(usize, String)>,
}

impl DomSurface {
    /// Prepare `host` as the scroll container and add the spacer.
    pub(crate) fn attach(host: &HtmlElement) -> Result<Self> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| GridError::Host("no document available".to_string()))?;

        let host_style = host.style();
        let _ = host_style.set_property("overflow", "auto");
        let _ = host_style.set_property("position", "relative");

        let spacer = create_div(&document)?;
        spacer.set_class_name("vgrid-content");
        let style = spacer.style();
        let _ = style.set_property("position", "relative");
        let _ = style.set_property("overflow", "hidden");
        host.append_child(&spacer)
            .map_err(|_| GridError::Host("could not attach content to host".to_string()))?;

        Ok(Self {
            document,
            spacer,
            cells: HashMap::new(),
            editor: InputOverlay::new(),
            editing: None,
        })
    }

    /// Remove the spacer and everything in it from the host.
    pub(crate) fn detach(&mut self) {
        self.clear();
        self.spacer.remove();
    }

    fn draw(&mut self, el: &HtmlElement, cell: &CellView<'_>) {
        place(el, cell.rect);
        let text = cell.value.to_string();
        if el.text_content().as_deref() != Some(text.as_str()) {
            el.set_text_content(Some(&text));
        }
        self.sync_editor(cell);
    }

    /// Show, move or hide the input overlay for `cell`.
    fn sync_editor(&mut self, cell: &CellView<'_>) {
        let is_current = self
            .editing
            .as_ref()
            .is_some_and(|(r, c)| *r == cell.row && c == cell.column);
        match (cell.editing, is_current) {
            (true, true) => self.editor.reposition(cell.rect),
            (true, false) => {
                self.editing = Some((cell.row, cell.column.to_string()));
                self.editor
                    .show(cell.rect, &cell.value.to_string(), &self.spacer);
            }
            (false, true) => self.close_editor(),
            (false, false) => {}
        }
    }

    fn close_editor(&mut self) {
        // Clear first: hiding blurs the input, which re-enters the host's
        // focusout listener.
        self.editing = None;
        self.editor.hide();
    }
}

impl CellSurface for DomSurface {
    fn set_content_size(&mut self, width: f64, height: f64) {
        let style = self.spacer.style();
        let _ = style.set_property("width", &format!("{width}px"));
        let _ = style.set_property("height", &format!("{height}px"));
    }

    fn mount(&mut self, cell: &CellView<'_>) {
        let Ok(el) = create_div(&self.document) else {
            return;
        };
        el.set_class_name(CELL_CLASS);
        let dataset = el.dataset();
        let _ = dataset.set("row", &cell.row.to_string());
        let _ = dataset.set("col", cell.column);
        let style = el.style();
        let _ = style.set_property("position", "absolute");
        let _ = style.set_property("box-sizing", "border-box");
        let _ = style.set_property("overflow", "hidden");
        let _ = style.set_property("white-space", "nowrap");
        self.draw(&el, cell);
        let _ = self.spacer.append_child(&el);
        self.cells.insert((cell.row, cell.column.to_string()), el);
    }

    fn update(&mut self, cell: &CellView<'_>) {
        let Some(el) = self.cells.get(&(cell.row, cell.column.to_string())).cloned() else {
            self.mount(cell);
            return;
        };
        self.draw(&el, cell);
    }

    fn unmount(&mut self, row: usize, column: &str) {
        if self
            .editing
            .as_ref()
            .is_some_and(|(r, c)| *r == row && c == column)
        {
            self.close_editor();
        }
        if let Some(el) = self.cells.remove(&(row, column.to_string())) {
            el.remove();
        }
    }

    fn clear(&mut self) {
        if self.editing.is_some() {
            self.close_editor();
        }
        for (_, el) in self.cells.drain() {
            el.remove();
        }
    }
}

fn create_div(document: &Document) -> Result<HtmlElement> {
    document
        .create_element("div")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| GridError::Host("could not create element".to_string()))
}

fn place(el: &HtmlElement, rect: CellRect) {
    let style = el.style();
    let _ = style.set_property("left", &format!("{}px", rect.x));
    let _ = style.set_property("top", &format!("{}px", rect.y));
    let _ = style.set_property("width", &format!("{}px", rect.width));
    let _ = style.set_property("height", &format!("{}px", rect.height));
}
