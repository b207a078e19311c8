/// Drag-to-resize for the workbench split panes
///
/// A drag gesture converts pointer positions into a split percentage along
/// one axis. While a gesture is active the host's cursor and text selection
/// are overridden through a process-wide `PointerLock`; the lock is a guard
/// whose release restores the host exactly once, whether the drag ends
/// normally, the pointer is released outside the window, or the controller
/// is torn down mid-drag.
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Divider between description and editor, moves along x
    Horizontal,
    /// Divider between editor and results, moves along y
    Vertical,
}

impl Axis {
    pub fn band(&self) -> SplitBand {
        match self {
            Axis::Horizontal => SplitBand { min: 10.0, max: 90.0 },
            Axis::Vertical => SplitBand { min: 20.0, max: 80.0 },
        }
    }

    pub fn default_percent(&self) -> f64 {
        match self {
            Axis::Horizontal => 50.0,
            Axis::Vertical => 60.0,
        }
    }

    fn cursor(&self) -> CursorStyle {
        match self {
            Axis::Horizontal => CursorStyle::ColResize,
            Axis::Vertical => CursorStyle::RowResize,
        }
    }
}

/// Open interval a split may occupy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitBand {
    pub min: f64,
    pub max: f64,
}

impl SplitBand {
    pub fn contains(&self, percent: f64) -> bool {
        percent > self.min && percent < self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Container the split is measured against, in pointer coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    Default,
    ColResize,
    RowResize,
}

/// Global input surface owned by the front end
pub trait CursorHost: Send + Sync {
    fn set_cursor(&self, style: CursorStyle);
    fn set_text_selection(&self, enabled: bool);
}

/// Host for front ends without a pointer
pub struct NoopCursorHost;

impl CursorHost for NoopCursorHost {
    fn set_cursor(&self, _style: CursorStyle) {}
    fn set_text_selection(&self, _enabled: bool) {}
}

/// Hands out the single process-wide pointer lock
#[derive(Clone)]
pub struct PointerLocks {
    holder: Arc<Mutex<Option<Axis>>>,
    host: Arc<dyn CursorHost>,
}

impl PointerLocks {
    pub fn new(host: Arc<dyn CursorHost>) -> Self {
        Self {
            holder: Arc::new(Mutex::new(None)),
            host,
        }
    }

    /// Acquire for `axis`, or `None` while another gesture holds it
    pub fn try_acquire(&self, axis: Axis) -> Option<PointerLock> {
        let mut holder = self.holder.lock().unwrap_or_else(PoisonError::into_inner);
        if holder.is_some() {
            return None;
        }
        *holder = Some(axis);
        drop(holder);

        self.host.set_cursor(axis.cursor());
        self.host.set_text_selection(false);
        debug!(axis = ?axis, "Pointer lock acquired");

        Some(PointerLock {
            axis,
            locks: self.clone(),
        })
    }

    pub fn holder(&self) -> Option<Axis> {
        *self.holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cursor/selection override, released on drop
pub struct PointerLock {
    axis: Axis,
    locks: PointerLocks,
}

impl PointerLock {
    pub fn axis(&self) -> Axis {
        self.axis
    }
}

impl Drop for PointerLock {
    fn drop(&mut self) {
        *self.locks.holder.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.locks.host.set_cursor(CursorStyle::Default);
        self.locks.host.set_text_selection(true);
        debug!(axis = ?self.axis, "Pointer lock released");
    }
}

pub struct DragResizeController {
    axis: Axis,
    band: SplitBand,
    percent: f64,
    gesture: Option<PointerLock>,
    locks: PointerLocks,
}

impl DragResizeController {
    pub fn new(axis: Axis, locks: PointerLocks) -> Self {
        Self {
            axis,
            band: axis.band(),
            percent: axis.default_percent(),
            gesture: None,
            locks,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn percent(&self) -> f64 {
        self.percent
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Start a gesture. Returns false if another axis is mid-drag.
    pub fn begin_drag(&mut self) -> bool {
        if self.gesture.is_some() {
            return true;
        }
        match self.locks.try_acquire(self.axis) {
            Some(lock) => {
                self.gesture = Some(lock);
                true
            }
            None => false,
        }
    }

    /// Follow the pointer. Returns the committed percentage, or `None` when
    /// not dragging or the position falls outside the band (the split then
    /// stays where it was instead of snapping to the edge).
    pub fn on_pointer_move(&mut self, pointer: Point, container: Rect) -> Option<f64> {
        if !self.is_dragging() {
            return None;
        }

        let (coord, origin, extent) = match self.axis {
            Axis::Horizontal => (pointer.x, container.x, container.width),
            Axis::Vertical => (pointer.y, container.y, container.height),
        };
        if !(coord.is_finite() && origin.is_finite() && extent.is_finite()) || extent <= 0.0 {
            return None;
        }

        let raw = (coord - origin) * 100.0 / extent;
        if !self.band.contains(raw) {
            return None;
        }
        self.percent = raw;
        Some(raw)
    }

    /// Finish the gesture; releases the pointer lock. Safe to call when idle.
    pub fn end_drag(&mut self) -> bool {
        self.gesture.take().is_some()
    }
}
