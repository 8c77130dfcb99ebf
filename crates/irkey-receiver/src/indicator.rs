//! Status LED behaviour. Purely diagnostic.
//!
//! While codes are arriving the LED flashes briefly on every accepted code.
//! After [`IDLE_AFTER_MS`] without a signal (or before the first one) it
//! switches to a slow blink so a glance tells whether the receiver is alive.

/// Silence after which the indicator goes to slow blink.
pub const IDLE_AFTER_MS: u64 = 5_000;
/// Half period of the slow blink.
pub const SLOW_BLINK_HALF_PERIOD_MS: u64 = 1_000;
/// How long the LED stays lit after an accepted code.
pub const ACTIVITY_FLASH_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorMode {
    /// A signal arrived within the last [`IDLE_AFTER_MS`].
    Active,
    SlowBlink,
}

#[derive(Debug, Default)]
pub struct LivenessIndicator {
    last_signal_ms: Option<u64>,
}

impl LivenessIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_signal(&mut self, now_ms: u64) {
        self.last_signal_ms = Some(now_ms);
    }

    pub fn last_signal_ms(&self) -> Option<u64> {
        self.last_signal_ms
    }

    pub fn mode(&self, now_ms: u64) -> IndicatorMode {
        match self.last_signal_ms {
            Some(at) if now_ms.saturating_sub(at) <= IDLE_AFTER_MS => IndicatorMode::Active,
            _ => IndicatorMode::SlowBlink,
        }
    }

    /// Whether the LED should be lit at `now_ms`.
    pub fn led_on(&self, now_ms: u64) -> bool {
        match (self.mode(now_ms), self.last_signal_ms) {
            (IndicatorMode::Active, Some(at)) => now_ms.saturating_sub(at) < ACTIVITY_FLASH_MS,
            _ => (now_ms / SLOW_BLINK_HALF_PERIOD_MS) % 2 == 0,
        }
    }
}
