//! Input abstraction layer.
//!
//! Normalizes mouse and touch pointers, keyboard and text-field events into
//! a unified `InputEvent` consumed by the controller. Positions are canvas
//! space; use [`InputEvent::pointer`] to map a raw client-space sample.

use ic_core::geometry::{ClientRect, PointerSample};
use kurbo::Point;

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed (mouse down, touch start).
    PointerDown { x: f64, y: f64 },

    /// Pointer moved (mouse move, touch move).
    PointerMove { x: f64, y: f64 },

    /// Pointer released.
    PointerUp { x: f64, y: f64 },

    /// Pointer left the canvas. Ends a gesture the same way `PointerUp` does.
    PointerLeave,

    /// Keyboard key. `key` is the DOM-style key name (`"z"`, `"Delete"`).
    Key { key: String, modifiers: Modifiers },

    /// The text field bound to the object being edited now holds `text`.
    TextInput { text: String },

    /// The text field lost focus.
    TextBlur,
}

impl InputEvent {
    pub fn down(p: Point) -> Self {
        Self::PointerDown { x: p.x, y: p.y }
    }

    pub fn moved(p: Point) -> Self {
        Self::PointerMove { x: p.x, y: p.y }
    }

    pub fn up(p: Point) -> Self {
        Self::PointerUp { x: p.x, y: p.y }
    }

    pub fn key(key: &str, modifiers: Modifiers) -> Self {
        Self::Key {
            key: key.to_string(),
            modifiers,
        }
    }

    /// Map a raw client-space sample to a canvas-space pointer event.
    /// Touch events without touch points map to nothing.
    pub fn pointer(phase: PointerPhase, sample: &PointerSample, rect: &ClientRect) -> Option<Self> {
        let p = sample.canvas_point(rect)?;
        Some(match phase {
            PointerPhase::Down => Self::down(p),
            PointerPhase::Move => Self::moved(p),
            PointerPhase::Up => Self::up(p),
        })
    }

    /// Extract position if this is a positioned pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown { x, y } | Self::PointerMove { x, y } | Self::PointerUp { x, y } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            Self::PointerDown { .. } | Self::PointerMove { .. } | Self::PointerUp { .. } | Self::PointerLeave
        )
    }
}
