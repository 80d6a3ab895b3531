//! Translates evdev batches into engine events and decides what gets forwarded.
//!
//! Runs on the event-loop thread. Pointer motion is integrated into a tracked
//! position (evdev mice only report relative motion), modifier keys from every
//! device are folded into one [`ModifierMask`], and button presses the engine
//! swallows have their matching release swallowed too.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};
use std::rc::Rc;

use evdev::{InputEvent, InputEventKind, Key, RelativeAxisType};

use crate::host::PointerSource;
use crate::input::{ButtonIndex, Disposition, ModifierMask, Point, RawInputEvent};

/// First mouse button code (`BTN_LEFT`); host button index 0.
const BTN_MOUSE: u16 = 0x110;
/// One past the last mouse button code (`BTN_JOYSTICK`).
const BTN_JOYSTICK: u16 = 0x120;

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Which reader a batch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOrigin {
    Pointer(usize),
    Keyboard(usize),
}

/// Events read from one device in one `read(2)`.
#[derive(Debug, Clone)]
pub struct DeviceBatch {
    pub origin: DeviceOrigin,
    pub events: Vec<InputEvent>,
}

/// What a reader thread sends to the event loop.
#[derive(Debug, Clone)]
pub enum DeviceMessage {
    Batch(DeviceBatch),
    /// The reader stopped; nothing more will arrive from this device.
    Gone(DeviceOrigin),
}

/// Pointer position integrated from relative motion.
#[derive(Debug, Clone, Default)]
pub struct TrackedPointer {
    position: Rc<Cell<Point>>,
}

impl TrackedPointer {
    fn nudge(&self, dx: f64, dy: f64) {
        let p = self.position.get();
        self.position.set(Point::new(p.x + dx, p.y + dy));
    }
}

impl PointerSource for TrackedPointer {
    fn position(&self) -> Point {
        self.position.get()
    }
}

/// Modifier keys currently held, per device. Shared with the scroll emitter,
/// which releases the stripped ones around each injected wheel report.
#[derive(Debug, Clone, Default)]
pub struct HeldModifiers {
    keys: Rc<RefCell<HashSet<(DeviceOrigin, u16)>>>,
}

impl HeldModifiers {
    fn press(&self, origin: DeviceOrigin, key: Key) {
        self.keys.borrow_mut().insert((origin, key.code()));
    }

    fn release(&self, origin: DeviceOrigin, key: Key) {
        self.keys.borrow_mut().remove(&(origin, key.code()));
    }

    fn forget(&self, origin: DeviceOrigin) {
        self.keys.borrow_mut().retain(|(held_by, _)| *held_by != origin);
    }

    fn mask(&self) -> ModifierMask {
        self.keys
            .borrow()
            .iter()
            .filter_map(|(_, code)| modifier_for(Key::new(*code)))
            .fold(ModifierMask::empty(), |acc, flag| acc | flag)
    }

    /// Held keys (deduplicated across devices, in code order) whose modifier is in `mask`.
    pub fn keys_in(&self, mask: ModifierMask) -> Vec<Key> {
        let codes: BTreeSet<u16> = self
            .keys
            .borrow()
            .iter()
            .map(|(_, code)| *code)
            .filter(|code| modifier_for(Key::new(*code)).is_some_and(|flag| mask.intersects(flag)))
            .collect();
        codes.into_iter().map(Key::new).collect()
    }
}

#[derive(Debug, Default)]
pub struct EvdevRouter {
    pointer: TrackedPointer,
    held: HeldModifiers,
    caps_lock: bool,
    flags: ModifierMask,
    swallowed: HashSet<(DeviceOrigin, u16)>,
}

impl EvdevRouter {
    pub fn new(caps_lock: bool) -> Self {
        let mut router = Self {
            caps_lock,
            ..Self::default()
        };
        router.flags = router.current_flags();
        router
    }

    pub fn pointer(&self) -> TrackedPointer {
        self.pointer.clone()
    }

    pub fn held_modifiers(&self) -> HeldModifiers {
        self.held.clone()
    }

    pub fn flags(&self) -> ModifierMask {
        self.flags
    }

    /// Routes one batch and returns the events to re-emit on the virtual device.
    pub fn handle_batch(
        &mut self,
        batch: &DeviceBatch,
        mut route: impl FnMut(RawInputEvent) -> Disposition,
    ) -> Vec<InputEvent> {
        let mut forward = Vec::with_capacity(batch.events.len());

        for event in &batch.events {
            match event.kind() {
                InputEventKind::Synchronization(_) => continue,
                InputEventKind::RelAxis(RelativeAxisType::REL_X) => {
                    self.pointer.nudge(f64::from(event.value()), 0.0);
                }
                InputEventKind::RelAxis(RelativeAxisType::REL_Y) => {
                    self.pointer.nudge(0.0, f64::from(event.value()));
                }
                InputEventKind::Key(key) if is_mouse_button(key) => {
                    if !self.route_button(batch.origin, key, event.value(), &mut route) {
                        continue;
                    }
                }
                InputEventKind::Key(key) => {
                    if self.track_modifier(batch.origin, key, event.value()) {
                        self.route_flags(&mut route);
                    }
                }
                _ => {}
            }
            forward.push(*event);
        }

        forward
    }

    /// Forgets everything a vanished device was holding, so its modifiers
    /// cannot keep key mode engaged.
    pub fn device_gone(
        &mut self,
        origin: DeviceOrigin,
        mut route: impl FnMut(RawInputEvent) -> Disposition,
    ) {
        self.held.forget(origin);
        self.swallowed.retain(|(held_by, _)| *held_by != origin);

        let flags = self.current_flags();
        if flags != self.flags {
            self.flags = flags;
            self.route_flags(&mut route);
        }
    }

    fn route_flags(&self, route: &mut impl FnMut(RawInputEvent) -> Disposition) {
        route(RawInputEvent::FlagsChanged {
            flags: self.flags,
            location: Some(self.pointer.position()),
        });
    }

    /// Returns whether the button event should be forwarded.
    fn route_button(
        &mut self,
        origin: DeviceOrigin,
        key: Key,
        value: i32,
        route: &mut impl FnMut(RawInputEvent) -> Disposition,
    ) -> bool {
        let code = key.code();
        match value {
            KEY_PRESS => {
                let disposition = route(RawInputEvent::ButtonDown {
                    button: ButtonIndex(u32::from(code - BTN_MOUSE)),
                    flags: self.flags,
                    location: Some(self.pointer.position()),
                });
                if disposition == Disposition::Swallow {
                    self.swallowed.insert((origin, code));
                    return false;
                }
                true
            }
            KEY_RELEASE => !self.swallowed.remove(&(origin, code)),
            // autorepeat
            _ => !self.swallowed.contains(&(origin, code)),
        }
    }

    /// Updates modifier state; returns true when the combined flags changed.
    fn track_modifier(&mut self, origin: DeviceOrigin, key: Key, value: i32) -> bool {
        if key == Key::KEY_CAPSLOCK {
            if value == KEY_PRESS {
                self.caps_lock = !self.caps_lock;
            }
        } else if modifier_for(key).is_some() {
            match value {
                KEY_PRESS => self.held.press(origin, key),
                KEY_RELEASE => self.held.release(origin, key),
                _ => {}
            }
        } else {
            return false;
        }

        let flags = self.current_flags();
        let changed = flags != self.flags;
        self.flags = flags;
        changed
    }

    fn current_flags(&self) -> ModifierMask {
        let mut flags = self.held.mask();
        if self.caps_lock {
            flags |= ModifierMask::CAPS_LOCK;
        }
        flags
    }
}

fn is_mouse_button(key: Key) -> bool {
    (BTN_MOUSE..BTN_JOYSTICK).contains(&key.code())
}

fn modifier_for(key: Key) -> Option<ModifierMask> {
    match key {
        Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => Some(ModifierMask::SHIFT),
        Key::KEY_LEFTCTRL | Key::KEY_RIGHTCTRL => Some(ModifierMask::CONTROL),
        Key::KEY_LEFTALT | Key::KEY_RIGHTALT => Some(ModifierMask::OPTION),
        Key::KEY_LEFTMETA | Key::KEY_RIGHTMETA => Some(ModifierMask::COMMAND),
        _ => None,
    }
}
