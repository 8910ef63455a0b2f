//! Drag-to-resize for side panels.
//!
//! A drag holds a [`CaptureGuard`] for its whole duration. The guard's drop
//! releases the capture, so every way a drag can end (pointer-up anywhere,
//! focus loss, the pointer leaving the window, the resize state itself being
//! dropped) restores the default cursor and text selection.

use tracing::trace;

/// Global pointer capture owned by a drag.
pub trait CaptureTarget {
    /// Show the resize cursor everywhere and suppress text selection.
    fn begin_capture(&mut self);
    /// Restore the default cursor and text selection.
    fn end_capture(&mut self);
}

/// Holds a capture until dropped.
pub struct CaptureGuard<T: CaptureTarget> {
    target: T,
}

impl<T: CaptureTarget> CaptureGuard<T> {
    pub fn acquire(mut target: T) -> Self {
        target.begin_capture();
        Self { target }
    }
}

impl<T: CaptureTarget> Drop for CaptureGuard<T> {
    fn drop(&mut self) {
        self.target.end_capture();
    }
}

/// Which screen edge the panel is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PanelSide {
    Left,
    Right,
}

/// Window-wide pointer state for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub x: f32,
    pub primary_down: bool,
    pub window_focused: bool,
    pub pointer_in_window: bool,
}

struct Drag<T: CaptureTarget> {
    origin_x: f32,
    origin_width: f32,
    _guard: CaptureGuard<T>,
}

pub struct PanelResize<T: CaptureTarget> {
    side: PanelSide,
    width: f32,
    min: f32,
    max: f32,
    drag: Option<Drag<T>>,
}

impl<T: CaptureTarget> PanelResize<T> {
    pub fn new(side: PanelSide, width: f32, min: f32, max: f32) -> Self {
        Self {
            side,
            width: width.clamp(min, max),
            min,
            max,
            drag: None,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer went down on the handle at `x`.
    pub fn begin(&mut self, x: f32, target: T) {
        trace!(side = ?self.side, x, "resize started");
        self.drag = Some(Drag {
            origin_x: x,
            origin_width: self.width,
            _guard: CaptureGuard::acquire(target),
        });
    }

    /// Follows the pointer while the drag lasts. Returns `true` while still
    /// dragging.
    pub fn update(&mut self, sample: PointerSample) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };

        if !sample.primary_down || !sample.window_focused || !sample.pointer_in_window {
            self.end();
            return false;
        }

        let delta = sample.x - drag.origin_x;
        let delta = match self.side {
            PanelSide::Left => delta,
            PanelSide::Right => -delta,
        };
        self.width = (drag.origin_width + delta).clamp(self.min, self.max);
        true
    }

    pub fn end(&mut self) {
        if self.drag.take().is_some() {
            trace!(side = ?self.side, width = self.width, "resize finished");
        }
    }
}
