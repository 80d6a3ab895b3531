//! Interfaces the engine consumes from the host platform.
//!
//! The engine never talks to a device or the OS directly; backends implement
//! these traits and the engine is generic over them, so tests can drive it
//! with scripted pointers and recording emitters.

use thiserror::Error;

use crate::input::{ModifierMask, Point};

/// Failures reported by host collaborators.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to inject scroll event: {0}")]
    Emit(#[source] std::io::Error),
}

/// Reads the current pointer location.
pub trait PointerSource {
    /// Current pointer position in screen coordinates. Must be side-effect free.
    fn position(&self) -> Point;
}

/// A synthesized wheel event, in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollEvent {
    /// Horizontal delta (positive scrolls content toward the left edge)
    pub x: i32,
    /// Vertical delta (positive scrolls up)
    pub y: i32,
    /// Modifier bits to clear from the event's flags before injection
    pub strip: Option<ModifierMask>,
}

impl ScrollEvent {
    /// Flags the injected event should carry, given the flags the host would
    /// otherwise stamp on it.
    pub fn effective_flags(&self, captured: ModifierMask) -> ModifierMask {
        match self.strip {
            Some(mask) => captured - mask,
            None => captured,
        }
    }
}

/// Injects synthesized scroll events into the host input pipeline.
pub trait ScrollEmitter {
    fn emit(&mut self, event: ScrollEvent) -> Result<(), HostError>;
}

/// One-time permission handshake with the host input-security subsystem.
pub trait TrustGate {
    /// Whether the process may currently intercept and inject input.
    fn is_trusted(&self) -> bool;

    /// Asks the user to grant access, returning the trust status right after asking.
    fn request_with_prompt(&self) -> bool;
}
