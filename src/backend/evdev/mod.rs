//! Linux host backend built on evdev and uinput.
//!
//! Pointers are grabbed (when button mode is enabled) so the toggle click can
//! be swallowed. Keyboards are grabbed when key mode is enabled so their
//! modifiers can be lifted around injected wheel steps. Everything a grabbed
//! device produces, apart from swallowed clicks, is re-emitted through a
//! uinput virtual device, which also carries the synthesized wheel events.
//! Modifier changes always pass through.

pub mod devices;
pub mod reader;
pub mod router;
pub mod trust;
pub mod uinput;

use anyhow::{Context, Result, bail};
use calloop::channel::Sender;
use evdev::{AttributeSet, Key, LedType, RelativeAxisType};
use log::{info, warn};

use crate::config::Tunables;
use devices::{DeviceRole, InputDevice};
use router::{DeviceMessage, DeviceOrigin};
use uinput::VirtualPointer;

pub use router::{EvdevRouter, HeldModifiers, TrackedPointer};
pub use trust::EvdevTrust;
pub use uinput::UinputScroll;

/// Opened and (where needed) grabbed input devices plus the virtual pointer.
pub struct EvdevBackend {
    pointers: Vec<InputDevice>,
    keyboards: Vec<InputDevice>,
    virtual_pointer: VirtualPointer,
    pointers_grabbed: bool,
    keyboards_grabbed: bool,
    caps_lock: bool,
}

impl EvdevBackend {
    /// Creates the interception point: virtual pointer first, then the grabs.
    ///
    /// # Errors
    /// Fails when no usable device exists, uinput is unavailable, or a grab is refused.
    pub fn open(tunables: &Tunables) -> Result<Self> {
        let (mut pointers, mut keyboards): (Vec<_>, Vec<_>) = devices::discover()
            .into_iter()
            .partition(|device| device.role == DeviceRole::Pointer);

        if pointers.is_empty() && keyboards.is_empty() {
            bail!("No pointer or keyboard devices found under {}", trust::INPUT_DIR);
        }
        if pointers.is_empty() {
            warn!("No pointer devices found; scroll velocity will stay at zero");
        }
        if tunables.key_mode_enabled() && keyboards.is_empty() {
            warn!("No keyboards found; key mode cannot activate");
        }

        // Caps Lock state comes from the keyboard LEDs; later presses toggle it
        let caps_lock = keyboards.iter().any(|keyboard| {
            keyboard
                .device
                .get_led_state()
                .is_ok_and(|leds| leds.contains(LedType::LED_CAPSL))
        });

        let pointers_grabbed = tunables.button_mode_enabled();
        let keyboards_grabbed = tunables.key_mode_enabled();

        let mut keys = AttributeSet::<Key>::new();
        let mut axes = AttributeSet::<RelativeAxisType>::new();
        let grabbed_devices = pointers
            .iter()
            .filter(|_| pointers_grabbed)
            .chain(keyboards.iter().filter(|_| keyboards_grabbed));
        for input in grabbed_devices {
            if let Some(supported) = input.device.supported_keys() {
                for key in supported.iter() {
                    keys.insert(key);
                }
            }
            if let Some(supported) = input.device.supported_relative_axes() {
                for axis in supported.iter() {
                    axes.insert(axis);
                }
            }
        }
        let virtual_pointer = VirtualPointer::build(&keys, &axes)?;
        info!("Virtual pointer '{}' created", uinput::VIRTUAL_DEVICE_NAME);

        if pointers_grabbed {
            grab_all(&mut pointers)?;
        }
        if keyboards_grabbed {
            grab_all(&mut keyboards)?;
        }

        if !keyboards_grabbed {
            for keyboard in &keyboards {
                info!("Watching {} ({})", keyboard.path.display(), keyboard.name);
            }
        }

        Ok(Self {
            pointers,
            keyboards,
            virtual_pointer,
            pointers_grabbed,
            keyboards_grabbed,
            caps_lock,
        })
    }

    /// Whether events from `origin` must be re-emitted (its device class is grabbed).
    pub fn forwards(&self, origin: DeviceOrigin) -> bool {
        match origin {
            DeviceOrigin::Pointer(_) => self.pointers_grabbed,
            DeviceOrigin::Keyboard(_) => self.keyboards_grabbed,
        }
    }

    pub fn router(&self) -> EvdevRouter {
        EvdevRouter::new(self.caps_lock)
    }

    pub fn virtual_pointer(&self) -> VirtualPointer {
        self.virtual_pointer.clone()
    }

    /// Moves every device onto its own reader thread.
    ///
    /// # Errors
    /// Fails if a reader thread cannot be spawned.
    pub fn spawn_readers(&mut self, sender: &Sender<DeviceMessage>) -> Result<()> {
        for (index, pointer) in self.pointers.drain(..).enumerate() {
            reader::spawn_reader(pointer.device, DeviceOrigin::Pointer(index), sender.clone())
                .with_context(|| format!("Failed to start reader for {}", pointer.path.display()))?;
        }
        for (index, keyboard) in self.keyboards.drain(..).enumerate() {
            reader::spawn_reader(keyboard.device, DeviceOrigin::Keyboard(index), sender.clone())
                .with_context(|| {
                    format!("Failed to start reader for {}", keyboard.path.display())
                })?;
        }
        Ok(())
    }
}

fn grab_all(devices: &mut [InputDevice]) -> Result<()> {
    for input in devices {
        input
            .device
            .grab()
            .with_context(|| format!("Failed to grab {}", input.path.display()))?;
        info!("Grabbed {} {} ({})", input.role, input.path.display(), input.name);
    }
    Ok(())
}
