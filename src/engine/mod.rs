//! Autoscroll activation and velocity engine.
//!
//! The [`Engine`] owns every piece of mutable autoscroll state: the combined
//! activation state, the anchor, and the single repeating timer. It is driven
//! by two message kinds, raw input and timer ticks, which a single-threaded
//! loop delivers one at a time. Nothing here blocks or locks.
//!
//! Invariants maintained by the engine:
//! - the anchor is set exactly while the activation state is active
//! - a timer is live only while active (or until the next tick notices otherwise)
//! - the anchor is captured only on the combined inactive → active edge

pub mod activation;
pub mod timer;
pub mod velocity;

#[cfg(test)]
mod tests;

pub use activation::{ActivationState, Edge, Transition};
pub use timer::{TickSource, TimerController, TimerState};
pub use velocity::{ScrollDelta, ScrollTuning};

use log::{debug, error, trace, warn};
use thiserror::Error;

use crate::config::Tunables;
use crate::host::{PointerSource, ScrollEmitter, ScrollEvent};
use crate::input::{Disposition, Point, RawInputEvent};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start autoscroll timer: {0}")]
    Timer(String),
    #[error("invalid scroll tuning: {0}")]
    InvalidTuning(&'static str),
}

/// One fire of the autoscroll timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerTick;

/// Messages delivered to the engine by its event loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    Input(RawInputEvent),
    Tick(TimerTick),
}

/// Engine reply to a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Input(Disposition),
    Tick(TickOutcome),
}

/// Whether the timer should keep firing after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The tick found autoscroll inactive and released the timer
    Stopped,
}

pub struct Engine<P, E, T: TickSource> {
    tunables: Tunables,
    tuning: ScrollTuning,
    state: ActivationState,
    anchor: Option<Point>,
    timer: TimerController<T>,
    pointer: P,
    emitter: E,
}

impl<P, E, T> Engine<P, E, T>
where
    P: PointerSource,
    E: ScrollEmitter,
    T: TickSource,
{
    pub fn new(tunables: Tunables, tuning: ScrollTuning, pointer: P, emitter: E, ticks: T) -> Self {
        Self {
            tunables,
            tuning,
            state: ActivationState::Inactive,
            anchor: None,
            timer: TimerController::new(ticks, tuning.tick_period()),
            pointer,
            emitter,
        }
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    /// Anchor of the current episode; `None` while inactive.
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    /// Single entry point for the event loop.
    pub fn dispatch(&mut self, message: Message) -> Response {
        match message {
            Message::Input(event) => Response::Input(self.handle_input(event)),
            Message::Tick(TimerTick) => Response::Tick(self.on_tick()),
        }
    }

    /// Routes one raw input event and reports whether the host should forward it.
    fn handle_input(&mut self, event: RawInputEvent) -> Disposition {
        let disposition = self.route_input(event);
        self.resume_timer();
        disposition
    }

    fn route_input(&mut self, event: RawInputEvent) -> Disposition {
        match event {
            RawInputEvent::ButtonDown {
                button,
                flags,
                location,
            } => {
                if self.tunables.button != Some(button) || !flags.is_empty() {
                    return Disposition::PassThrough;
                }
                let transition = self.state.toggle_button();
                debug!(
                    "Button {} toggled autoscroll: {:?} -> {:?}",
                    button.0, self.state, transition.next
                );
                self.apply(transition, location);
                Disposition::Swallow
            }
            RawInputEvent::FlagsChanged { flags, location } => {
                if !self.tunables.key_mode_enabled() {
                    return Disposition::PassThrough;
                }
                let transition = self.state.with_key(flags.holds(self.tunables.modifiers));
                if transition.next != self.state {
                    debug!(
                        "Modifiers {:?} changed key mode: {:?} -> {:?}",
                        flags, self.state, transition.next
                    );
                }
                self.apply(transition, location);
                Disposition::PassThrough
            }
        }
    }

    fn apply(&mut self, transition: Transition, location: Option<Point>) {
        self.state = transition.next;
        match transition.edge {
            Some(Edge::Activated) => {
                let anchor = location.unwrap_or_else(|| self.pointer.position());
                debug!("Autoscroll active, anchor at ({:.1}, {:.1})", anchor.x, anchor.y);
                self.anchor = Some(anchor);
                if let Err(err) = self.timer.start() {
                    error!("{}", err);
                }
            }
            Some(Edge::Deactivated) => {
                debug!("Autoscroll inactive");
                self.timer.stop();
                self.anchor = None;
            }
            None => {}
        }
    }

    /// Retries a timer whose start failed on the activation edge.
    fn resume_timer(&mut self) {
        if !self.state.is_active() || self.timer.state() == TimerState::Running {
            return;
        }
        match self.timer.start() {
            Ok(()) => debug!("Autoscroll timer recovered"),
            Err(err) => error!("{}", err),
        }
    }

    /// Handles one timer fire: emits a scroll step or stops a stale timer.
    fn on_tick(&mut self) -> TickOutcome {
        if !self.state.is_active() {
            debug!("Timer fired while inactive");
            self.timer.retire();
            return TickOutcome::Stopped;
        }

        let Some(anchor) = self.anchor else {
            error!("Autoscroll active without an anchor; stopping timer");
            self.timer.retire();
            return TickOutcome::Stopped;
        };

        let current = self.pointer.position();
        let Some(delta) = self
            .tuning
            .scroll_delta(anchor, current, self.tunables.speed)
        else {
            return TickOutcome::Continue;
        };

        let event = ScrollEvent {
            x: delta.x,
            y: delta.y,
            strip: self
                .state
                .key_enabled()
                .then_some(self.tunables.modifiers),
        };
        trace!("Scroll step {:?}", event);
        if let Err(err) = self.emitter.emit(event) {
            warn!("{}", err);
        }
        TickOutcome::Continue
    }

    /// Releases the timer; used when the event loop exits.
    pub fn shutdown(&mut self) {
        self.timer.stop();
    }
}
