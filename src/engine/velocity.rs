//! Converts pointer displacement from the anchor into per-tick scroll deltas.

use std::time::Duration;

use super::EngineError;
use crate::input::Point;

/// Per-axis displacement (pixels) below which no scroll is generated.
pub const DEADZONE_PX: f64 = 6.0;
/// Scroll units per tick, per pixel of displacement, per unit of speed.
pub const GAIN: f64 = 0.20;
/// Saturation of each axis, in scroll units per tick.
pub const MAX_SCROLL_PER_TICK: f64 = 80.0;
/// Timer rate while autoscroll is active.
pub const TICK_HZ: f64 = 60.0;

/// Numeric tuning of the velocity curve and tick rate.
///
/// Only constructible through [`ScrollTuning::new`] or `Default`, so the clamp
/// bound is never negative and the tick rate is always positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTuning {
    deadzone_px: f64,
    gain: f64,
    max_scroll_per_tick: f64,
    tick_hz: f64,
}

impl Default for ScrollTuning {
    fn default() -> Self {
        Self {
            deadzone_px: DEADZONE_PX,
            gain: GAIN,
            max_scroll_per_tick: MAX_SCROLL_PER_TICK,
            tick_hz: TICK_HZ,
        }
    }
}

/// Integer scroll delta for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollDelta {
    pub x: i32,
    pub y: i32,
}

impl ScrollTuning {
    /// # Errors
    /// Rejects non-finite values, a negative deadzone or clamp, and a tick rate that is not positive.
    pub fn new(
        deadzone_px: f64,
        gain: f64,
        max_scroll_per_tick: f64,
        tick_hz: f64,
    ) -> Result<Self, EngineError> {
        if !deadzone_px.is_finite() || deadzone_px < 0.0 {
            return Err(EngineError::InvalidTuning("deadzone must be finite and non-negative"));
        }
        if !gain.is_finite() {
            return Err(EngineError::InvalidTuning("gain must be finite"));
        }
        if !max_scroll_per_tick.is_finite() || max_scroll_per_tick < 0.0 {
            return Err(EngineError::InvalidTuning(
                "scroll limit must be finite and non-negative",
            ));
        }
        if !tick_hz.is_finite() || tick_hz <= 0.0 {
            return Err(EngineError::InvalidTuning("tick rate must be finite and positive"));
        }
        Ok(Self {
            deadzone_px,
            gain,
            max_scroll_per_tick,
            tick_hz,
        })
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz)
    }

    /// Computes the delta for one tick, or `None` when sitting inside the deadzone.
    ///
    /// Both axes are negated: screen Y grows downward while a positive wheel
    /// delta scrolls up, so dragging below the anchor scrolls down.
    pub fn scroll_delta(&self, anchor: Point, current: Point, speed: i32) -> Option<ScrollDelta> {
        let dx = self.apply_deadzone(current.x - anchor.x);
        let dy = self.apply_deadzone(current.y - anchor.y);

        let speed = f64::from(speed);
        let limit = self.max_scroll_per_tick;
        let scroll_x = (-speed * self.gain * dx).clamp(-limit, limit);
        let scroll_y = (-speed * self.gain * dy).clamp(-limit, limit);

        if scroll_x == 0.0 && scroll_y == 0.0 {
            return None;
        }

        Some(ScrollDelta {
            x: scroll_x as i32,
            y: scroll_y as i32,
        })
    }

    fn apply_deadzone(&self, d: f64) -> f64 {
        if d.abs() < self.deadzone_px { 0.0 } else { d }
    }
}
