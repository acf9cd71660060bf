//! Viewport state management for scrolling.

use super::GridLayout;

/// Viewport state - represents the visible area of the grid
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Horizontal scroll position in grid coordinates
    pub scroll_x: f64,
    /// Vertical scroll position in grid coordinates
    pub scroll_y: f64,
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Viewport {
    /// Create a viewport of the given size scrolled to the origin
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    /// Largest scroll offsets that still keep content in view.
    pub fn max_scroll(&self, layout: &GridLayout) -> (f64, f64) {
        (
            (layout.total_width() - self.width).max(0.0),
            (layout.total_height() - self.height).max(0.0),
        )
    }

    /// Clamp scroll position to `[0, total - viewport]` on both axes.
    pub fn clamp_scroll(&mut self, layout: &GridLayout) {
        let (max_x, max_y) = self.max_scroll(layout);
        self.scroll_x = clamp_finite(self.scroll_x, max_x);
        self.scroll_y = clamp_finite(self.scroll_y, max_y);
    }

    /// Scroll by delta amounts
    pub fn scroll_by(&mut self, delta_x: f64, delta_y: f64, layout: &GridLayout) {
        self.scroll_x += delta_x;
        self.scroll_y += delta_y;
        self.clamp_scroll(layout);
    }

    /// Set absolute scroll position
    pub fn set_scroll(&mut self, x: f64, y: f64, layout: &GridLayout) {
        self.scroll_x = x;
        self.scroll_y = y;
        self.clamp_scroll(layout);
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Convert grid coordinates to viewport coordinates
    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.scroll_x, y - self.scroll_y)
    }

    /// Convert viewport coordinates to grid coordinates
    pub fn to_grid(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        (screen_x + self.scroll_x, screen_y + self.scroll_y)
    }
}

/// NaN scroll requests collapse to the origin.
fn clamp_finite(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::layout::{ColumnSet, DEFAULT_COL_WIDTH};
    use std::collections::HashMap;

    fn layout(rows: usize, cols: usize) -> GridLayout {
        let keys: Vec<String> = (0..cols).map(|i| format!("c{i}")).collect();
        let set = ColumnSet::new(&keys, DEFAULT_COL_WIDTH, 16.0, &HashMap::new());
        GridLayout::new(rows, 28.0, &HashMap::new(), &set, DEFAULT_COL_WIDTH)
    }

    #[test]
    fn test_clamp_scroll() {
        let layout = layout(20, 5); // 560 x 500
        let mut viewport = Viewport::new(300.0, 200.0);

        viewport.set_scroll(10_000.0, 10_000.0, &layout);
        assert_eq!(viewport.scroll_x, 200.0);
        assert_eq!(viewport.scroll_y, 360.0);

        viewport.set_scroll(-5.0, f64::NAN, &layout);
        assert_eq!(viewport.scroll_x, 0.0);
        assert_eq!(viewport.scroll_y, 0.0);
    }

    #[test]
    fn test_content_smaller_than_viewport() {
        let layout = layout(2, 1);
        let mut viewport = Viewport::new(800.0, 600.0);
        viewport.scroll_by(50.0, 50.0, &layout);
        assert_eq!(viewport.scroll_x, 0.0);
        assert_eq!(viewport.scroll_y, 0.0);
    }

    #[test]
    fn test_coordinate_roundtrip() {
        let mut viewport = Viewport::new(100.0, 100.0);
        viewport.scroll_x = 40.0;
        viewport.scroll_y = 280.0;
        assert_eq!(viewport.to_screen(140.0, 300.0), (100.0, 20.0));
        assert_eq!(viewport.to_grid(100.0, 20.0), (140.0, 300.0));
    }
}
