//! `ResizeObserver` wrapper feeding container sizes to the grid.

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, ResizeObserver, ResizeObserverEntry};

use crate::error::{GridError, Result};

/// Observes one element; disconnects when dropped.
pub(crate) struct DomResizeObserver {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(Array)>,
}

impl DomResizeObserver {
    /// Call `on_resize(width, height)` with the content-box size of `target`
    /// whenever it changes.
    pub(crate) fn observe<F>(target: &Element, mut on_resize: F) -> Result<Self>
    where
        F: FnMut(f64, f64) + 'static,
    {
        let callback = Closure::wrap(Box::new(move |entries: Array| {
            // Only the latest measurement matters.
            let last = entries
                .iter()
                .filter_map(|e| e.dyn_into::<ResizeObserverEntry>().ok())
                .last();
            if let Some(entry) = last {
                let rect = entry.content_rect();
                on_resize(rect.width(), rect.height());
            }
        }) as Box<dyn FnMut(Array)>);

        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|_| GridError::Host("ResizeObserver unavailable".to_string()))?;
        observer.observe(target);
        tracing::debug!("resize observer attached");

        Ok(Self {
            observer,
            _callback: callback,
        })
    }

    pub(crate) fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for DomResizeObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
