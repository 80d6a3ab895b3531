//! Input event vocabulary shared by the engine and host backends.
//!
//! Backends translate device-specific events into [`RawInputEvent`]s and act
//! on the [`Disposition`] the engine returns for each one.

pub mod events;
pub mod modifiers;

pub use events::{ButtonIndex, Disposition, Point, RawInputEvent};
pub use modifiers::ModifierMask;
