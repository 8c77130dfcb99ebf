//! Host-side debounce: turns the stream of received codes into discrete
//! button events.
//!
//! The receiver already collapses repeat frames, but it is a best-effort
//! filter on cheap hardware; this one is authoritative.
//!
//! # Rules
//!
//! - A code that differs from the previous code is accepted as a `Press`.
//! - The same code again is accepted only when more than the repeat threshold
//!   has passed since it was last *accepted*. While the button is still down
//!   (no `Release` in between) that acceptance is a `Hold`.
//! - In single-tap mode the same code is suppressed until a different code
//!   arrives or the cool-down has passed since it was last *seen*, so a held
//!   button yields one action.
//! - When nothing has been seen for the release timeout after an accepted
//!   code, one `Release` is produced for it.
//!
//! Time is passed in by the caller so the rules are testable without sleeping.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use irkey_core::NormalizedCode;

/// Per-code tracking is pruned once this many codes have been seen.
const PRUNE_ABOVE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub repeat_threshold: Duration,
    pub tap_cooldown: Duration,
    pub release_timeout: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            repeat_threshold: Duration::from_millis(200),
            tap_cooldown: Duration::from_millis(500),
            release_timeout: Duration::from_millis(500),
        }
    }
}

impl DebounceConfig {
    /// Release never fires before a held repeat could have been accepted.
    fn effective_release_timeout(&self) -> Duration {
        self.release_timeout.max(self.repeat_threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonEventKind {
    Press,
    Hold,
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonEvent {
    pub code: NormalizedCode,
    pub kind: ButtonEventKind,
    pub at: Instant,
}

#[derive(Debug)]
pub struct Debouncer {
    config: DebounceConfig,
    previous: Option<NormalizedCode>,
    last_seen: HashMap<NormalizedCode, Instant>,
    last_accepted: HashMap<NormalizedCode, Instant>,
    /// Accepted code still awaiting its `Release`.
    pressed: Option<NormalizedCode>,
}

impl Debouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            previous: None,
            last_seen: HashMap::new(),
            last_accepted: HashMap::new(),
            pressed: None,
        }
    }

    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    /// Feeds one received code. Returns the event it produces, if any.
    pub fn observe(
        &mut self,
        code: NormalizedCode,
        at: Instant,
        single_tap: bool,
    ) -> Option<ButtonEvent> {
        let seen_before = self.last_seen.insert(code.clone(), at);
        let differs = self.previous.as_ref() != Some(&code);
        self.previous = Some(code.clone());

        let accept = if differs {
            true
        } else if single_tap {
            seen_before.map_or(true, |seen| {
                at.saturating_duration_since(seen) > self.config.tap_cooldown
            })
        } else {
            self.last_accepted.get(&code).map_or(true, |accepted| {
                at.saturating_duration_since(*accepted) > self.config.repeat_threshold
            })
        };

        if self.last_seen.len() > PRUNE_ABOVE {
            self.prune(at);
        }
        if !accept {
            return None;
        }

        let kind = if !differs && !single_tap && self.pressed.as_ref() == Some(&code) {
            ButtonEventKind::Hold
        } else {
            ButtonEventKind::Press
        };
        self.last_accepted.insert(code.clone(), at);
        self.pressed = Some(code.clone());
        Some(ButtonEvent { code, kind, at })
    }

    /// Emits the `Release` for the pressed code once the link has been quiet
    /// for the release timeout.
    pub fn poll_idle(&mut self, now: Instant) -> Option<ButtonEvent> {
        let code = self.pressed.as_ref()?;
        let seen = self.last_seen.get(code)?;
        if now.saturating_duration_since(*seen) < self.config.effective_release_timeout() {
            return None;
        }
        let code = self.pressed.take()?;
        Some(ButtonEvent {
            code,
            kind: ButtonEventKind::Release,
            at: now,
        })
    }

    /// The code currently considered held down.
    pub fn pressed(&self) -> Option<&NormalizedCode> {
        self.pressed.as_ref()
    }

    /// Forgets all history, e.g. after a reconnect.
    pub fn reset(&mut self) {
        self.previous = None;
        self.last_seen.clear();
        self.last_accepted.clear();
        self.pressed = None;
    }

    fn prune(&mut self, now: Instant) {
        let horizon = self
            .config
            .repeat_threshold
            .max(self.config.tap_cooldown)
            .max(self.config.effective_release_timeout());
        self.last_seen
            .retain(|_, seen| now.saturating_duration_since(*seen) <= horizon);
        self.last_accepted
            .retain(|_, accepted| now.saturating_duration_since(*accepted) <= horizon);
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}
