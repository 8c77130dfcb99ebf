//! Runtime state of one dispatch session.
//!
//! Everything the special actions are allowed to change lives here, in one
//! explicit object owned by the dispatcher, instead of in globals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use irkey_core::HidKeyCode;

/// Shared cancellation flag for the dispatch loop.
///
/// Cloning yields another handle to the same flag; Ctrl-C handlers, the
/// `stop` special action and tests all trigger the same signal.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ghost key settings: a harmless key tapped after every real action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostKey {
    pub key: HidKeyCode,
    pub hold: Duration,
}

impl Default for GhostKey {
    fn default() -> Self {
        Self {
            key: HidKeyCode::F10,
            hold: Duration::from_millis(200),
        }
    }
}

/// Flags toggled at runtime by special actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSession {
    pub ghost_key_enabled: bool,
    pub single_tap_enabled: bool,
    /// When off, a held button fires once and its `Hold` events are dropped.
    pub repeat_enabled: bool,
    pub ghost: GhostKey,
}

impl DispatchSession {
    pub fn new(ghost_key_enabled: bool, single_tap_enabled: bool, ghost: GhostKey) -> Self {
        Self {
            ghost_key_enabled,
            single_tap_enabled,
            repeat_enabled: true,
            ghost,
        }
    }

    /// Flips ghost-key injection and returns the new state.
    pub fn toggle_ghost(&mut self) -> bool {
        self.ghost_key_enabled = !self.ghost_key_enabled;
        self.ghost_key_enabled
    }

    /// Flips single-tap mode and returns the new state.
    pub fn toggle_tap(&mut self) -> bool {
        self.single_tap_enabled = !self.single_tap_enabled;
        self.single_tap_enabled
    }

    /// Flips auto-repeat and returns the new state.
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat_enabled = !self.repeat_enabled;
        self.repeat_enabled
    }
}

impl Default for DispatchSession {
    fn default() -> Self {
        Self::new(false, false, GhostKey::default())
    }
}

/// Point-in-time view of the bridge, logged on start and stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub running: bool,
    pub connected: bool,
    pub profile: String,
    pub ghost_key_enabled: bool,
    pub single_tap_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_signal_is_shared_between_clones() {
        // Arrange
        let signal = StopSignal::new();
        let handle = signal.clone();

        // Act
        handle.trigger();

        // Assert
        assert!(signal.is_triggered());
    }

    #[test]
    fn test_toggles_flip_and_report_new_state() {
        let mut session = DispatchSession::default();

        assert!(session.toggle_ghost());
        assert!(session.toggle_tap());
        assert!(!session.toggle_ghost());
        assert!(!session.ghost_key_enabled);
        assert!(session.single_tap_enabled);
        assert!(session.repeat_enabled);
        assert!(!session.toggle_repeat());
    }

    #[test]
    fn test_default_ghost_key_is_f10_for_200ms() {
        let ghost = GhostKey::default();
        assert_eq!(ghost.key, HidKeyCode::F10);
        assert_eq!(ghost.hold, Duration::from_millis(200));
    }
}
