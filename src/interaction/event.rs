use serde::{Deserialize, Serialize};

/// Interaction events routed through a dispatch tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    MouseClick,
    MouseDown,
    MouseUp,
    MouseMove,
    PressedMouseMove,
    MouseDoubleClick,
    MouseRightClick,
    MouseEnter,
    MouseLeave,
    MouseWheelHorizontal,
    MouseWheelVertical,
    TouchStart,
    TouchMove,
    TouchEnd,
}

/// Pointer or touch sample in surface-local logical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub page_x: f64,
    pub page_y: f64,
    pub is_touch: bool,
}

impl PointerEvent {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            page_x: x,
            page_y: y,
            is_touch: false,
        }
    }

    #[must_use]
    pub fn touch(x: f64, y: f64) -> Self {
        Self {
            is_touch: true,
            ..Self::new(x, y)
        }
    }

    #[must_use]
    pub fn with_page_position(mut self, page_x: f64, page_y: f64) -> Self {
        self.page_x = page_x;
        self.page_y = page_y;
        self
    }
}

/// Axis-aligned interactive region in logical units. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    #[must_use]
    pub fn contains(self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.left + self.width && y >= self.top && y <= self.top + self.height
    }

    /// Hit test usable with [`crate::interaction::DispatchTree::create_node_with_hit_test`].
    #[must_use]
    pub fn hit_test(self) -> impl Fn(&PointerEvent) -> bool + 'static {
        move |event: &PointerEvent| self.contains(event.x, event.y)
    }
}
