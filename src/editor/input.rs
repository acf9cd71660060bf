//! DOM input overlay for the cell being edited.
//!
//! One `<input>` element is created lazily inside the content spacer and
//! moved over whichever cell is editing, so it scrolls with the cells.
//! Keyboard and focus handling live in the `web` module's delegated
//! listeners on the host element.

use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement};

use crate::layout::CellRect;

/// Class name the delegated listeners use to recognise the editor.
pub(crate) const EDITOR_CLASS: &str = "vgrid-editor";

/// Input overlay for cell editing.
pub(crate) struct InputOverlay {
    input: Option<HtmlInputElement>,
}

impl InputOverlay {
    pub(crate) fn new() -> Self {
        InputOverlay { input: None }
    }

    /// Show the overlay over `rect` (grid coordinates) with `text`, focused
    /// and fully selected.
    pub(crate) fn show(&mut self, rect: CellRect, text: &str, parent: &HtmlElement) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(input) = self.get_or_create_input(&document, parent) else {
            return;
        };
        place(input, rect);
        let _ = input.style().set_property("display", "block");
        input.set_value(text);
        let _ = input.focus();
        input.select();
    }

    /// Follow the edited cell after a layout change without touching the text.
    pub(crate) fn reposition(&self, rect: CellRect) {
        if let Some(ref input) = self.input {
            place(input, rect);
        }
    }

    pub(crate) fn hide(&mut self) {
        if let Some(ref input) = self.input {
            let _ = input.style().set_property("display", "none");
            let _ = input.blur();
        }
    }

    fn get_or_create_input(
        &mut self,
        document: &Document,
        parent: &HtmlElement,
    ) -> Option<&HtmlInputElement> {
        if self.input.is_none() {
            let input = document
                .create_element("input")
                .ok()?
                .dyn_into::<HtmlInputElement>()
                .ok()?;
            input.set_type("text");
            input.set_class_name(EDITOR_CLASS);
            let style = input.style();
            let _ = style.set_property("position", "absolute");
            let _ = style.set_property("z-index", "10");
            let _ = style.set_property("box-sizing", "border-box");
            let _ = style.set_property("margin", "0");
            let _ = style.set_property("font", "inherit");
            let _ = style.set_property("display", "none");
            let _ = parent.append_child(&input);
            self.input = Some(input);
        }
        self.input.as_ref()
    }
}

fn place(input: &HtmlInputElement, rect: CellRect) {
    let style = input.style();
    let _ = style.set_property("left", &format!("{}px", rect.x));
    let _ = style.set_property("top", &format!("{}px", rect.y));
    let _ = style.set_property("width", &format!("{}px", rect.width));
    let _ = style.set_property("height", &format!("{}px", rect.height));
}

impl Drop for InputOverlay {
    fn drop(&mut self) {
        if let Some(ref input) = self.input {
            if let Some(parent) = input.parent_node() {
                let _ = parent.remove_child(input);
            }
        }
    }
}
