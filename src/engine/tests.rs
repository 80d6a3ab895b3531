use super::timer::testing::CountingTicks;
use super::*;
use crate::host::HostError;
use crate::input::{ButtonIndex, ModifierMask};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Clone, Default)]
struct ScriptedPointer(Rc<Cell<Point>>);

impl ScriptedPointer {
    fn move_to(&self, x: f64, y: f64) {
        self.0.set(Point::new(x, y));
    }
}

impl PointerSource for ScriptedPointer {
    fn position(&self) -> Point {
        self.0.get()
    }
}

#[derive(Clone, Default)]
struct RecordingEmitter(Rc<RefCell<Vec<ScrollEvent>>>);

impl RecordingEmitter {
    fn events(&self) -> Vec<ScrollEvent> {
        self.0.borrow().clone()
    }
}

impl ScrollEmitter for RecordingEmitter {
    fn emit(&mut self, event: ScrollEvent) -> Result<(), HostError> {
        self.0.borrow_mut().push(event);
        Ok(())
    }
}

const MIDDLE: ButtonIndex = ButtonIndex(2);

struct Harness {
    engine: Engine<ScriptedPointer, RecordingEmitter, CountingTicks>,
    pointer: ScriptedPointer,
    emitter: RecordingEmitter,
    ticks: CountingTicks,
}

fn harness() -> Harness {
    harness_with(Tunables::default())
}

fn harness_with(tunables: Tunables) -> Harness {
    let pointer = ScriptedPointer::default();
    let emitter = RecordingEmitter::default();
    let ticks = CountingTicks::default();
    let engine = Engine::new(
        tunables,
        ScrollTuning::default(),
        pointer.clone(),
        emitter.clone(),
        ticks.clone(),
    );
    Harness {
        engine,
        pointer,
        emitter,
        ticks,
    }
}

fn click(x: f64, y: f64) -> RawInputEvent {
    RawInputEvent::ButtonDown {
        button: MIDDLE,
        flags: ModifierMask::empty(),
        location: Some(Point::new(x, y)),
    }
}

fn flags(mask: ModifierMask) -> RawInputEvent {
    RawInputEvent::FlagsChanged {
        flags: mask,
        location: None,
    }
}

#[test]
fn configured_click_is_swallowed_and_activates() {
    let mut h = harness();
    assert_eq!(h.engine.handle_input(click(10.0, 20.0)), Disposition::Swallow);
    assert_eq!(h.engine.state(), ActivationState::ViaButton);
    assert_eq!(h.engine.anchor(), Some(Point::new(10.0, 20.0)));
    assert_eq!(h.engine.timer_state(), TimerState::Running);
    assert_eq!(h.ticks.live(), 1);
}

#[test]
fn other_buttons_pass_through() {
    let mut h = harness();
    let event = RawInputEvent::ButtonDown {
        button: ButtonIndex(0),
        flags: ModifierMask::empty(),
        location: None,
    };
    assert_eq!(h.engine.handle_input(event), Disposition::PassThrough);
    assert_eq!(h.engine.state(), ActivationState::Inactive);
}

#[test]
fn click_with_modifiers_passes_through() {
    let mut h = harness();
    let event = RawInputEvent::ButtonDown {
        button: MIDDLE,
        flags: ModifierMask::CONTROL,
        location: None,
    };
    assert_eq!(h.engine.handle_input(event), Disposition::PassThrough);
    assert_eq!(h.engine.state(), ActivationState::Inactive);
    assert_eq!(h.ticks.armed.get(), 0);
}

#[test]
fn disabled_button_mode_ignores_clicks() {
    let mut h = harness_with(Tunables {
        button: None,
        ..Tunables::default()
    });
    assert_eq!(h.engine.handle_input(click(0.0, 0.0)), Disposition::PassThrough);
    assert!(!h.engine.state().is_active());
}

#[test]
fn disabled_key_mode_ignores_flags() {
    let mut h = harness_with(Tunables {
        modifiers: ModifierMask::empty(),
        ..Tunables::default()
    });
    assert_eq!(
        h.engine.handle_input(flags(ModifierMask::all())),
        Disposition::PassThrough
    );
    assert!(!h.engine.state().is_active());
}

#[test]
fn second_click_deactivates_and_stops_timer() {
    let mut h = harness();
    h.engine.handle_input(click(0.0, 0.0));
    h.engine.handle_input(click(0.0, 0.0));
    assert_eq!(h.engine.state(), ActivationState::Inactive);
    assert_eq!(h.engine.anchor(), None);
    assert_eq!(h.ticks.live(), 0);
    assert_eq!(h.ticks.disarmed.get(), 1);
}

#[test]
fn flags_are_always_passed_through() {
    let mut h = harness();
    assert_eq!(
        h.engine.handle_input(flags(ModifierMask::SHIFT)),
        Disposition::PassThrough
    );
    assert_eq!(
        h.engine.handle_input(flags(ModifierMask::empty())),
        Disposition::PassThrough
    );
}

#[test]
fn key_mode_requires_full_combination() {
    let mut h = harness_with(Tunables {
        modifiers: ModifierMask::SHIFT | ModifierMask::OPTION,
        ..Tunables::default()
    });
    h.engine.handle_input(flags(ModifierMask::SHIFT));
    assert!(!h.engine.state().is_active());

    h.engine
        .handle_input(flags(ModifierMask::SHIFT | ModifierMask::OPTION | ModifierMask::CONTROL));
    assert_eq!(h.engine.state(), ActivationState::ViaKey);
}

#[test]
fn key_activation_without_location_samples_pointer() {
    let mut h = harness();
    h.pointer.move_to(300.0, 200.0);
    h.engine.handle_input(flags(ModifierMask::SHIFT));
    assert_eq!(h.engine.anchor(), Some(Point::new(300.0, 200.0)));
}

#[test]
fn button_toggle_during_key_mode_keeps_anchor() {
    let mut h = harness();
    h.pointer.move_to(50.0, 50.0);
    h.engine.handle_input(flags(ModifierMask::SHIFT));
    let p1 = Point::new(50.0, 50.0);
    assert_eq!(h.engine.anchor(), Some(p1));

    assert_eq!(h.engine.handle_input(click(400.0, 400.0)), Disposition::Swallow);
    assert_eq!(h.engine.state(), ActivationState::ViaBoth);
    assert_eq!(h.engine.anchor(), Some(p1));
    assert_eq!(h.ticks.armed.get(), 1);

    h.pointer.move_to(50.0, 150.0);
    h.engine.on_tick();
    assert_eq!(h.emitter.events().last().map(|e| e.y), Some(-60));
}

#[test]
fn deactivation_waits_for_both_sources() {
    let mut h = harness();
    h.engine.handle_input(click(0.0, 0.0));
    let p1 = Point::new(0.0, 0.0);

    h.pointer.move_to(500.0, 500.0);
    h.engine.handle_input(flags(ModifierMask::SHIFT));
    assert_eq!(h.engine.anchor(), Some(p1));

    h.engine.handle_input(flags(ModifierMask::empty()));
    assert_eq!(h.engine.state(), ActivationState::ViaButton);
    assert_eq!(h.engine.timer_state(), TimerState::Running);

    h.engine.handle_input(click(500.0, 500.0));
    assert_eq!(h.engine.timer_state(), TimerState::Stopped);
    assert_eq!(h.ticks.live(), 0);

    let emitted = h.emitter.events().len();
    h.pointer.move_to(900.0, 900.0);
    assert_eq!(h.engine.on_tick(), TickOutcome::Stopped);
    assert_eq!(h.emitter.events().len(), emitted);
}

#[test]
fn reactivation_captures_fresh_anchor() {
    let mut h = harness();
    h.engine.handle_input(click(10.0, 10.0));
    h.engine.handle_input(click(10.0, 10.0));
    h.engine.handle_input(click(70.0, 80.0));
    assert_eq!(h.engine.anchor(), Some(Point::new(70.0, 80.0)));
    assert_eq!(h.ticks.armed.get(), 2);
    assert_eq!(h.ticks.live(), 1);
}

#[test]
fn button_mode_scroll_is_not_stripped() {
    let mut h = harness();
    h.engine.handle_input(click(0.0, 0.0));
    h.pointer.move_to(100.0, 0.0);
    assert_eq!(h.engine.on_tick(), TickOutcome::Continue);
    assert_eq!(
        h.emitter.events(),
        vec![ScrollEvent {
            x: -60,
            y: 0,
            strip: None
        }]
    );
}

#[test]
fn key_mode_scroll_strips_configured_modifiers() {
    let mut h = harness();
    h.pointer.move_to(0.0, 0.0);
    h.engine.handle_input(flags(ModifierMask::SHIFT | ModifierMask::CONTROL));
    h.pointer.move_to(100.0, 0.0);
    h.engine.on_tick();

    let event = h.emitter.events()[0];
    assert_eq!((event.x, event.y), (-60, 0));
    assert_eq!(event.strip, Some(ModifierMask::SHIFT));
    let raw = ModifierMask::SHIFT | ModifierMask::CONTROL;
    assert_eq!(event.effective_flags(raw), ModifierMask::CONTROL);
}

#[test]
fn strip_follows_key_state_at_emission_time() {
    let mut h = harness();
    h.engine.handle_input(click(0.0, 0.0));
    h.engine.handle_input(flags(ModifierMask::SHIFT));
    h.pointer.move_to(0.0, 100.0);
    h.engine.on_tick();
    h.engine.handle_input(flags(ModifierMask::empty()));
    h.engine.on_tick();

    let strips: Vec<_> = h.emitter.events().iter().map(|e| e.strip).collect();
    assert_eq!(strips, vec![Some(ModifierMask::SHIFT), None]);
}

#[test]
fn deadzone_ticks_emit_nothing_but_keep_running() {
    let mut h = harness();
    h.engine.handle_input(click(100.0, 100.0));
    h.pointer.move_to(104.0, 95.0);
    for _ in 0..5 {
        assert_eq!(h.engine.on_tick(), TickOutcome::Continue);
    }
    assert!(h.emitter.events().is_empty());
    assert_eq!(h.engine.timer_state(), TimerState::Running);
}

#[test]
fn saturated_scroll_is_clamped() {
    let mut h = harness();
    h.engine.handle_input(click(0.0, 0.0));
    h.pointer.move_to(0.0, -1000.0);
    h.engine.on_tick();
    assert_eq!(h.emitter.events()[0].y, 80);
}

#[test]
fn stale_tick_releases_timer() {
    let mut h = harness();
    assert_eq!(h.engine.on_tick(), TickOutcome::Stopped);
    assert_eq!(h.ticks.live(), 0);
    assert!(h.emitter.events().is_empty());
}

#[test]
fn failed_timer_start_keeps_state_consistent() {
    let mut h = harness();
    h.ticks.fail_next.set(true);
    h.engine.handle_input(click(0.0, 0.0));
    assert!(h.engine.state().is_active());
    assert_eq!(h.engine.timer_state(), TimerState::Stopped);

    h.engine.handle_input(click(0.0, 0.0));
    assert!(!h.engine.state().is_active());
    assert_eq!(h.ticks.live(), 0);
}

#[test]
fn failed_timer_start_is_retried_on_next_input() {
    let mut h = harness();
    h.ticks.fail_next.set(true);
    h.engine.handle_input(click(10.0, 10.0));
    assert_eq!(h.engine.timer_state(), TimerState::Stopped);

    // modifiers that do not complete the combination are not an edge
    h.engine.handle_input(flags(ModifierMask::CONTROL));
    assert_eq!(h.engine.state(), ActivationState::ViaButton);
    assert_eq!(h.engine.timer_state(), TimerState::Running);
    assert_eq!(h.ticks.live(), 1);
    assert_eq!(h.engine.anchor(), Some(Point::new(10.0, 10.0)));
}

#[test]
fn ignored_input_while_inactive_does_not_arm() {
    let mut h = harness();
    h.engine.handle_input(RawInputEvent::ButtonDown {
        button: ButtonIndex(0),
        flags: ModifierMask::empty(),
        location: None,
    });
    assert_eq!(h.ticks.armed.get(), 0);
}

#[test]
fn dispatch_routes_both_message_kinds() {
    let mut h = harness();
    assert_eq!(
        h.engine.dispatch(Message::Input(click(0.0, 0.0))),
        Response::Input(Disposition::Swallow)
    );
    h.pointer.move_to(0.0, 20.0);
    assert_eq!(
        h.engine.dispatch(Message::Tick(TimerTick)),
        Response::Tick(TickOutcome::Continue)
    );
    assert_eq!(h.emitter.events().len(), 1);
}

#[test]
fn shutdown_releases_running_timer() {
    let mut h = harness();
    h.engine.handle_input(click(0.0, 0.0));
    h.engine.shutdown();
    assert_eq!(h.ticks.live(), 0);
    h.engine.shutdown();
    assert_eq!(h.ticks.disarmed.get(), 1);
}
