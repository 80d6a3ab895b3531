//! Single-threaded calloop dispatch loop owning the engine.
//!
//! Raw input arrives through a `calloop::channel` fed by the reader threads;
//! the autoscroll timer is a `calloop::timer::Timer` registered and removed
//! by [`LoopTicks`]. Both are dispatched on this one thread, so the engine
//! needs no synchronization.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopHandle, RegistrationToken, channel};
use log::{debug, info, warn};

use super::evdev::router::{DeviceBatch, DeviceMessage};
use super::evdev::uinput::VirtualPointer;
use super::evdev::{EvdevBackend, EvdevRouter, TrackedPointer, UinputScroll};
use crate::config::Tunables;
use crate::engine::{
    Engine, EngineError, Message, Response, ScrollTuning, TickOutcome, TickSource, TimerTick,
};
use crate::input::{Disposition, RawInputEvent};

/// How often the loop wakes to check for a quit request.
const QUIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Loop data that can receive timer fires.
pub trait TickTarget {
    fn tick(&mut self) -> TickOutcome;
}

/// [`TickSource`] registering calloop timers on a loop whose data is `D`.
pub struct LoopTicks<D: 'static> {
    handle: LoopHandle<'static, D>,
}

impl<D: 'static> LoopTicks<D> {
    pub fn new(handle: LoopHandle<'static, D>) -> Self {
        Self { handle }
    }
}

impl<D: TickTarget + 'static> TickSource for LoopTicks<D> {
    type Handle = RegistrationToken;

    fn arm(&mut self, period: Duration) -> Result<RegistrationToken, EngineError> {
        self.handle
            .insert_source(
                Timer::from_duration(period),
                move |deadline, _, data: &mut D| match data.tick() {
                    // Absolute deadlines keep the rate fixed regardless of dispatch latency
                    TickOutcome::Continue => TimeoutAction::ToInstant(deadline + period),
                    TickOutcome::Stopped => TimeoutAction::Drop,
                },
            )
            .map_err(|err| EngineError::Timer(err.error.to_string()))
    }

    fn disarm(&mut self, token: RegistrationToken) {
        self.handle.remove(token);
    }
}

pub type EvdevEngine = Engine<TrackedPointer, UinputScroll, LoopTicks<LoopState>>;

/// Everything the loop callbacks touch.
pub struct LoopState {
    engine: EvdevEngine,
    router: EvdevRouter,
    virtual_pointer: VirtualPointer,
    backend: EvdevBackend,
}

impl LoopState {
    fn receive(&mut self, message: DeviceMessage) {
        match message {
            DeviceMessage::Batch(batch) => self.route(batch),
            DeviceMessage::Gone(origin) => {
                info!("Input device {:?} went away", origin);
                let engine = &mut self.engine;
                self.router
                    .device_gone(origin, |event| deliver_input(engine, event));
            }
        }
    }

    fn route(&mut self, batch: DeviceBatch) {
        let engine = &mut self.engine;
        let forward = self
            .router
            .handle_batch(&batch, |event| deliver_input(engine, event));

        if !self.backend.forwards(batch.origin) {
            return;
        }
        if let Err(err) = self.virtual_pointer.forward(&forward) {
            warn!("Failed to forward {:?} events: {}", batch.origin, err);
        }
    }
}

fn deliver_input(engine: &mut EvdevEngine, event: RawInputEvent) -> Disposition {
    match engine.dispatch(Message::Input(event)) {
        Response::Input(disposition) => disposition,
        Response::Tick(_) => Disposition::PassThrough,
    }
}

impl TickTarget for LoopState {
    fn tick(&mut self) -> TickOutcome {
        match self.engine.dispatch(Message::Tick(TimerTick)) {
            Response::Tick(outcome) => outcome,
            Response::Input(_) => TickOutcome::Continue,
        }
    }
}

/// Runs the engine until `quit` is raised, then releases the timer.
///
/// # Errors
/// Fails if the loop or its input channel cannot be registered (fatal at startup).
pub fn run(
    mut backend: EvdevBackend,
    tunables: Tunables,
    tuning: ScrollTuning,
    quit: Arc<AtomicBool>,
) -> Result<()> {
    let mut event_loop: EventLoop<'static, LoopState> =
        EventLoop::try_new().context("Failed to create event loop")?;
    let handle = event_loop.handle();

    let (sender, input_channel) = channel::channel::<DeviceMessage>();
    handle
        .insert_source(input_channel, |event, _, state: &mut LoopState| {
            if let channel::Event::Msg(message) = event {
                state.receive(message);
            }
        })
        .map_err(|err| anyhow!("Failed to register input event source: {}", err.error))?;

    let router = backend.router();
    let virtual_pointer = backend.virtual_pointer();
    let engine = Engine::new(
        tunables,
        tuning,
        router.pointer(),
        virtual_pointer.scroll_emitter(router.held_modifiers()),
        LoopTicks::new(handle.clone()),
    );

    backend.spawn_readers(&sender)?;
    drop(sender);

    let mut state = LoopState {
        engine,
        router,
        virtual_pointer,
        backend,
    };

    info!(
        "dragscroll ready (button {}, keys {:?}, speed {})",
        tunables.button_number(),
        tunables.modifiers.names(),
        tunables.speed
    );

    let signal = event_loop.get_signal();
    event_loop
        .run(QUIT_POLL_INTERVAL, &mut state, |_| {
            if quit.load(Ordering::Acquire) {
                signal.stop();
            }
        })
        .context("Event loop failed")?;

    debug!("Event loop stopped");
    state.engine.shutdown();
    Ok(())
}
