// Enumerates evdev nodes and sorts them into pointers (grabbed) and keyboards (observed).
use std::fmt;
use std::path::PathBuf;

use evdev::{AbsoluteAxisType, AttributeSetRef, Device, Key, RelativeAxisType};
use log::{debug, warn};

use super::uinput::VIRTUAL_DEVICE_NAME;

/// How the daemon uses a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    /// Relative pointer with buttons; grabbed so clicks can be swallowed
    Pointer,
    /// Keyboard; read without grabbing to track modifiers
    Keyboard,
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceRole::Pointer => f.pad("pointer"),
            DeviceRole::Keyboard => f.pad("keyboard"),
        }
    }
}

pub struct InputDevice {
    pub path: PathBuf,
    pub name: String,
    pub role: DeviceRole,
    pub device: Device,
}

/// Decides a device's role from its capabilities. Pointer capability wins for
/// combo devices, since every event of a grabbed node is forwarded anyway.
pub fn classify(
    keys: Option<&AttributeSetRef<Key>>,
    axes: Option<&AttributeSetRef<RelativeAxisType>>,
) -> Option<DeviceRole> {
    let has_key = |key| keys.is_some_and(|keys| keys.contains(key));
    let has_axis = |axis| axes.is_some_and(|axes| axes.contains(axis));

    if has_axis(RelativeAxisType::REL_X) && has_axis(RelativeAxisType::REL_Y) && has_key(Key::BTN_LEFT)
    {
        Some(DeviceRole::Pointer)
    } else if has_key(Key::KEY_LEFTSHIFT) && has_key(Key::KEY_A) {
        Some(DeviceRole::Keyboard)
    } else {
        None
    }
}

/// Touchpads and tablets report absolute positions only, which the pointer
/// tracker does not integrate.
pub fn is_absolute_pointer(
    keys: Option<&AttributeSetRef<Key>>,
    abs: Option<&AttributeSetRef<AbsoluteAxisType>>,
) -> bool {
    let has_key = |key| keys.is_some_and(|keys| keys.contains(key));
    let has_axis = |axis| abs.is_some_and(|abs| abs.contains(axis));

    has_axis(AbsoluteAxisType::ABS_X)
        && has_axis(AbsoluteAxisType::ABS_Y)
        && (has_key(Key::BTN_TOUCH) || has_key(Key::BTN_LEFT))
}

/// Opens every readable `/dev/input/event*` node with a pointer or keyboard role.
pub fn discover() -> Vec<InputDevice> {
    let mut found: Vec<InputDevice> = evdev::enumerate()
        .filter_map(|(path, device)| {
            let name = device.name().unwrap_or("unknown").to_string();
            if name == VIRTUAL_DEVICE_NAME {
                return None;
            }
            let role = classify(device.supported_keys(), device.supported_relative_axes());
            match role {
                Some(role) => {
                    debug!("Found {} {} ({})", role, path.display(), name);
                    Some(InputDevice {
                        path,
                        name,
                        role,
                        device,
                    })
                }
                None => {
                    if is_absolute_pointer(device.supported_keys(), device.supported_absolute_axes()) {
                        warn!(
                            "Ignoring {} ({}): absolute pointers are not tracked, \
                             autoscroll will not follow it",
                            path.display(),
                            name
                        );
                    }
                    None
                }
            }
        })
        .collect();
    found.sort_by(|a, b| a.path.cmp(&b.path));
    found
}
