//! Modifier key masks.

use bitflags::bitflags;

bitflags! {
    /// Set of modifier keys, as carried by flags-changed events and as
    /// configured for key-mode activation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ModifierMask: u32 {
        /// Caps Lock (a lock state, not a held key)
        const CAPS_LOCK = 1 << 0;
        /// Either Shift key
        const SHIFT = 1 << 1;
        /// Either Control key
        const CONTROL = 1 << 2;
        /// Either Alt/Option key
        const OPTION = 1 << 3;
        /// Either Super/Meta/Command key
        const COMMAND = 1 << 4;
    }
}

impl ModifierMask {
    /// Resolves a configured key name (case-insensitive).
    ///
    /// Recognized names: `capslock`, `shift`, `control`, `option`, `command`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "capslock" => Some(Self::CAPS_LOCK),
            "shift" => Some(Self::SHIFT),
            "control" => Some(Self::CONTROL),
            "option" => Some(Self::OPTION),
            "command" => Some(Self::COMMAND),
            _ => None,
        }
    }

    /// Returns true when every bit of `required` is set in `self`.
    ///
    /// An empty `required` mask never matches; an empty combination means
    /// key mode is disabled, not that it is permanently held.
    pub fn holds(self, required: ModifierMask) -> bool {
        !required.is_empty() && self.contains(required)
    }

    /// Lowercase names of the set bits, in a stable order.
    pub fn names(self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for (flag, name) in [
            (Self::CAPS_LOCK, "capslock"),
            (Self::SHIFT, "shift"),
            (Self::CONTROL, "control"),
            (Self::OPTION, "option"),
            (Self::COMMAND, "command"),
        ] {
            if self.contains(flag) {
                names.push(name);
            }
        }
        names
    }
}
