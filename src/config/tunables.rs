//! Startup tunables read once from the preference store.

use log::{debug, warn};

use super::PreferenceStore;
use crate::input::{ButtonIndex, ModifierMask};

/// Button used when the preference is missing or out of range (1-based, middle button).
pub const DEFAULT_BUTTON: u32 = 3;
/// Modifier combination used when the preference is missing or invalid.
pub const DEFAULT_KEYS: ModifierMask = ModifierMask::SHIFT;
/// Speed multiplier used when the preference is missing.
pub const DEFAULT_SPEED: i32 = 3;
/// Maximum number of names accepted in the `keys` array.
pub const MAX_KEY_COUNT: usize = 5;

const MIN_BUTTON: u32 = 3;
const MAX_BUTTON: u32 = 32;

/// Immutable settings for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunables {
    /// Host button index that toggles autoscroll; `None` disables button mode
    pub button: Option<ButtonIndex>,
    /// Modifier combination that must be held for key mode; empty disables key mode
    pub modifiers: ModifierMask,
    /// Multiplier applied to the velocity curve
    pub speed: i32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            button: button_index(DEFAULT_BUTTON),
            modifiers: DEFAULT_KEYS,
            speed: DEFAULT_SPEED,
        }
    }
}

impl Tunables {
    /// Reads `button`, `keys` and `speed`, substituting defaults for anything malformed.
    pub fn from_store(store: &impl PreferenceStore) -> Self {
        let tunables = Self {
            button: read_button(store),
            modifiers: read_keys(store),
            speed: read_speed(store),
        };
        debug!("Tunables: {:?}", tunables);
        tunables
    }

    /// The configured button as the user writes it (1-based, 0 when disabled).
    pub fn button_number(&self) -> u32 {
        self.button.map_or(0, |ButtonIndex(index)| index + 1)
    }

    pub fn button_mode_enabled(&self) -> bool {
        self.button.is_some()
    }

    pub fn key_mode_enabled(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

/// Converts the 1-based preference value into the host's 0-based index.
fn button_index(number: u32) -> Option<ButtonIndex> {
    number.checked_sub(1).map(ButtonIndex)
}

fn read_button(store: &impl PreferenceStore) -> Option<ButtonIndex> {
    let number = match store.get_int("button") {
        Some(0) => return None,
        Some(value) if (MIN_BUTTON as i32..=MAX_BUTTON as i32).contains(&value) => value as u32,
        Some(value) => {
            warn!(
                "Invalid button {}, expected 0 or {}-{}; using {}",
                value, MIN_BUTTON, MAX_BUTTON, DEFAULT_BUTTON
            );
            DEFAULT_BUTTON
        }
        None => DEFAULT_BUTTON,
    };
    button_index(number)
}

fn read_keys(store: &impl PreferenceStore) -> ModifierMask {
    let Some(names) = store.get_string_array("keys", MAX_KEY_COUNT) else {
        return DEFAULT_KEYS;
    };

    let mut mask = ModifierMask::empty();
    for name in &names {
        match ModifierMask::from_key_name(name) {
            Some(flag) => mask |= flag,
            None => {
                warn!("Unknown modifier key '{}', using default keys", name);
                return DEFAULT_KEYS;
            }
        }
    }
    mask
}

fn read_speed(store: &impl PreferenceStore) -> i32 {
    store.get_int("speed").unwrap_or(DEFAULT_SPEED)
}
