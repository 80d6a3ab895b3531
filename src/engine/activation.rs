//! Combined activation state of the two autoscroll sources.

/// Which sources currently keep autoscroll alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationState {
    #[default]
    Inactive,
    /// Toggled on by the configured button
    ViaButton,
    /// Held modifier combination
    ViaKey,
    ViaBoth,
}

/// A flip of the combined "active" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Activated,
    Deactivated,
}

/// Result of applying one source change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ActivationState,
    pub edge: Option<Edge>,
}

impl ActivationState {
    fn from_sources(button: bool, key: bool) -> Self {
        match (button, key) {
            (false, false) => Self::Inactive,
            (true, false) => Self::ViaButton,
            (false, true) => Self::ViaKey,
            (true, true) => Self::ViaBoth,
        }
    }

    pub fn button_enabled(self) -> bool {
        matches!(self, Self::ViaButton | Self::ViaBoth)
    }

    pub fn key_enabled(self) -> bool {
        matches!(self, Self::ViaKey | Self::ViaBoth)
    }

    pub fn is_active(self) -> bool {
        self != Self::Inactive
    }

    /// Flips the button source. Always changes state, whatever key mode is doing.
    pub fn toggle_button(self) -> Transition {
        self.transition_to(Self::from_sources(!self.button_enabled(), self.key_enabled()))
    }

    /// Sets the key source to whether the configured combination is held.
    pub fn with_key(self, held: bool) -> Transition {
        self.transition_to(Self::from_sources(self.button_enabled(), held))
    }

    fn transition_to(self, next: Self) -> Transition {
        let edge = match (self.is_active(), next.is_active()) {
            (false, true) => Some(Edge::Activated),
            (true, false) => Some(Edge::Deactivated),
            _ => None,
        };
        Transition { next, edge }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_toggle_from_inactive_activates() {
        let t = ActivationState::Inactive.toggle_button();
        assert_eq!(t.next, ActivationState::ViaButton);
        assert_eq!(t.edge, Some(Edge::Activated));
    }

    #[test]
    fn button_toggle_while_key_held_has_no_edge() {
        let on = ActivationState::ViaKey.toggle_button();
        assert_eq!(on.next, ActivationState::ViaBoth);
        assert_eq!(on.edge, None);

        let off = on.next.toggle_button();
        assert_eq!(off.next, ActivationState::ViaKey);
        assert_eq!(off.edge, None);
    }

    #[test]
    fn key_release_keeps_button_mode_alive() {
        let t = ActivationState::ViaBoth.with_key(false);
        assert_eq!(t.next, ActivationState::ViaButton);
        assert_eq!(t.edge, None);
    }

    #[test]
    fn key_release_alone_deactivates() {
        let t = ActivationState::ViaKey.with_key(false);
        assert_eq!(t.next, ActivationState::Inactive);
        assert_eq!(t.edge, Some(Edge::Deactivated));
    }

    #[test]
    fn repeated_key_state_is_not_an_edge() {
        let t = ActivationState::ViaKey.with_key(true);
        assert_eq!(t.next, ActivationState::ViaKey);
        assert_eq!(t.edge, None);

        let t = ActivationState::Inactive.with_key(false);
        assert_eq!(t.next, ActivationState::Inactive);
        assert_eq!(t.edge, None);
    }
}
