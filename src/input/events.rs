//! Raw input events delivered to the engine by a host backend.

use super::modifiers::ModifierMask;

/// A location in screen coordinates (Y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Zero-based button index as reported by the host (0 = left, 1 = right, 2 = middle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonIndex(pub u32);

/// The two event kinds a host backend forwards to the router.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInputEvent {
    /// A pointer button was pressed.
    ButtonDown {
        button: ButtonIndex,
        /// Modifier flags active when the button went down
        flags: ModifierMask,
        /// Where the press happened, if the backend knows
        location: Option<Point>,
    },
    /// The set of held modifiers changed.
    FlagsChanged {
        flags: ModifierMask,
        location: Option<Point>,
    },
}

/// What the host should do with the original event after routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forward the event to the rest of the system
    PassThrough,
    /// Drop the event; no application should see it
    Swallow,
}
