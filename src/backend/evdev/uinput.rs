//! The uinput virtual device: forwards pass-through events from grabbed
//! devices and injects synthesized wheel steps.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use anyhow::{Context, Result};
use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, Key, RelativeAxisType};
use log::trace;

use super::router::HeldModifiers;
use crate::host::{HostError, ScrollEmitter, ScrollEvent};
use crate::input::ModifierMask;

pub const VIRTUAL_DEVICE_NAME: &str = "dragscroll virtual pointer";

/// High-resolution wheel units per detent.
const HI_RES_PER_DETENT: i32 = 120;

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Shared handle to the virtual device. Only the event-loop thread touches it.
#[derive(Clone)]
pub struct VirtualPointer {
    device: Rc<RefCell<VirtualDevice>>,
}

impl VirtualPointer {
    /// Creates the virtual device with the union of the grabbed devices'
    /// capabilities (pointers and, in key mode, keyboards) plus both wheel axes.
    pub fn build(
        keys: &AttributeSet<Key>,
        axes: &AttributeSet<RelativeAxisType>,
    ) -> Result<Self> {
        let mut keys_all = AttributeSet::<Key>::new();
        for key in keys.iter() {
            keys_all.insert(key);
        }
        keys_all.insert(Key::BTN_LEFT);

        let mut axes_all = AttributeSet::<RelativeAxisType>::new();
        for axis in axes.iter() {
            axes_all.insert(axis);
        }
        for axis in [
            RelativeAxisType::REL_X,
            RelativeAxisType::REL_Y,
            RelativeAxisType::REL_WHEEL,
            RelativeAxisType::REL_HWHEEL,
            RelativeAxisType::REL_WHEEL_HI_RES,
            RelativeAxisType::REL_HWHEEL_HI_RES,
        ] {
            axes_all.insert(axis);
        }

        let device = VirtualDeviceBuilder::new()
            .context("Failed to open /dev/uinput")?
            .name(VIRTUAL_DEVICE_NAME)
            .with_keys(&keys_all)
            .context("Failed to set key capabilities")?
            .with_relative_axes(&axes_all)
            .context("Failed to set relative axis capabilities")?
            .build()
            .context("Failed to build uinput device")?;

        Ok(Self {
            device: Rc::new(RefCell::new(device)),
        })
    }

    /// Re-emits events from a grabbed device as one report.
    pub fn forward(&self, events: &[InputEvent]) -> io::Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        self.device.borrow_mut().emit(events)
    }

    /// Emitter that strips modifiers by releasing the keys in `held` around each step.
    pub fn scroll_emitter(&self, held: HeldModifiers) -> UinputScroll {
        UinputScroll {
            device: self.device.clone(),
            wheel: WheelAccumulator::default(),
            held,
        }
    }
}

/// Emits [`ScrollEvent`]s through the virtual pointer.
///
/// Pixel deltas map one-to-one onto high-resolution wheel units; whole
/// detents are also reported on the classic axes for clients that ignore
/// the high-resolution ones. uinput events carry no modifier field, so a
/// strip is done on the seat instead: the held modifier keys are released in
/// a report of their own before the wheel report and pressed again after it.
/// Keyboards are grabbed in key mode, so the compositor only sees their keys
/// through this same device.
pub struct UinputScroll {
    device: Rc<RefCell<VirtualDevice>>,
    wheel: WheelAccumulator,
    held: HeldModifiers,
}

impl ScrollEmitter for UinputScroll {
    fn emit(&mut self, event: ScrollEvent) -> Result<(), HostError> {
        let mut device = self.device.borrow_mut();
        let mut result = Ok(());
        // Every report is attempted so stripped keys are always pressed again
        for report in scroll_reports(&mut self.wheel, &self.held, event) {
            if let Err(err) = device.emit(&report) {
                if result.is_ok() {
                    result = Err(HostError::Emit(err));
                }
            }
        }
        result
    }
}

/// Splits one scroll step into uinput reports (each gets its own `SYN_REPORT`).
fn scroll_reports(
    wheel: &mut WheelAccumulator,
    held: &HeldModifiers,
    event: ScrollEvent,
) -> Vec<Vec<InputEvent>> {
    let steps = wheel.events_for(event);
    if steps.is_empty() {
        return Vec::new();
    }

    let stripped = match event.strip {
        Some(mask) => {
            if mask.contains(ModifierMask::CAPS_LOCK) {
                trace!("Caps Lock is a lock state and cannot be stripped");
            }
            held.keys_in(mask)
        }
        None => Vec::new(),
    };
    if stripped.is_empty() {
        return vec![steps];
    }

    vec![
        stripped.iter().map(|key| key_event(*key, KEY_RELEASE)).collect(),
        steps,
        stripped.iter().map(|key| key_event(*key, KEY_PRESS)).collect(),
    ]
}

/// Converts pixel deltas into wheel events, carrying partial detents over.
#[derive(Debug, Default)]
struct WheelAccumulator {
    vertical: i32,
    horizontal: i32,
}

impl WheelAccumulator {
    fn events_for(&mut self, event: ScrollEvent) -> Vec<InputEvent> {
        let mut events = Vec::with_capacity(4);

        if event.y != 0 {
            events.push(rel(RelativeAxisType::REL_WHEEL_HI_RES, event.y));
            if let Some(detents) = take_detents(&mut self.vertical, event.y) {
                events.push(rel(RelativeAxisType::REL_WHEEL, detents));
            }
        }

        // evdev's positive horizontal wheel scrolls right, the opposite of ScrollEvent::x
        let hwheel = -event.x;
        if hwheel != 0 {
            events.push(rel(RelativeAxisType::REL_HWHEEL_HI_RES, hwheel));
            if let Some(detents) = take_detents(&mut self.horizontal, hwheel) {
                events.push(rel(RelativeAxisType::REL_HWHEEL, detents));
            }
        }

        events
    }
}

fn take_detents(remainder: &mut i32, delta: i32) -> Option<i32> {
    *remainder += delta;
    let detents = *remainder / HI_RES_PER_DETENT;
    *remainder %= HI_RES_PER_DETENT;
    (detents != 0).then_some(detents)
}

fn rel(axis: RelativeAxisType, value: i32) -> InputEvent {
    InputEvent::new(EventType::RELATIVE, axis.0, value)
}

fn key_event(key: Key, value: i32) -> InputEvent {
    InputEvent::new(EventType::KEY, key.code(), value)
}
