//! Container size tracking.
//!
//! The host (or the browser binding's `ResizeObserver`) feeds measurements in;
//! the bridge filters out repeats and bad readings so a re-virtualization pass
//! only runs when the box really changed.

/// Why a measurement was discarded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResizeError {
    #[error("invalid container size {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
    #[error("resize observation detached")]
    Detached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeBridge {
    width: f64,
    height: f64,
    attached: bool,
}

impl ResizeBridge {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            attached: true,
        }
    }

    /// Last accepted size.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Record a measurement. `Ok(true)` when the size changed.
    pub fn observe(&mut self, width: f64, height: f64) -> Result<bool, ResizeError> {
        if !self.attached {
            return Err(ResizeError::Detached);
        }
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(width) || !valid(height) {
            return Err(ResizeError::InvalidSize { width, height });
        }
        let changed =
            (self.width - width).abs() > f64::EPSILON || (self.height - height).abs() > f64::EPSILON;
        if changed {
            self.width = width;
            self.height = height;
        }
        Ok(changed)
    }

    /// Stop accepting measurements.
    pub fn detach(&mut self) {
        self.attached = false;
    }
}
