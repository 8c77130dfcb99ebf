//! The receiver main loop, independent of the actual board.
//!
//! A board support layer implements [`IrDecoder`] and [`StatusLed`], owns a
//! serial writer, and then calls [`Receiver::tick`] from its loop and
//! [`Receiver::handle_command_byte`] for every byte received from the host.

use std::io::Write;

use irkey_core::protocol::line::{
    format_code_line, format_last_code_reply, format_status_reply, RESET_REPLY,
};
use irkey_core::ReceiverCommand;
use thiserror::Error;
use tracing::{debug, trace};

use crate::detection::RawDetection;
use crate::indicator::{IndicatorMode, LivenessIndicator};
use crate::normalizer::{NormalizerConfig, SignalNormalizer, Verdict};

/// The IR decoding substrate (hardware demodulator plus protocol decoder).
pub trait IrDecoder {
    /// Returns the next decoded frame, if one completed.
    fn poll(&mut self, now_ms: u64) -> Option<RawDetection>;

    /// Re-initialises the decoder, dropping any partial frame.
    fn restart(&mut self);
}

/// The on-board status LED.
pub trait StatusLed {
    fn set(&mut self, on: bool);
}

#[derive(Debug, Error)]
pub enum ReceiverError {
    #[error("serial write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Running counters reported in the `STATUS:` line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub accepted: u64,
    pub noise: u64,
    pub repeats: u64,
}

pub struct Receiver<D, L, W> {
    decoder: D,
    led: L,
    out: W,
    normalizer: SignalNormalizer,
    indicator: LivenessIndicator,
    led_on: Option<bool>,
    stats: ReceiverStats,
}

impl<D: IrDecoder, L: StatusLed, W: Write> Receiver<D, L, W> {
    pub fn new(decoder: D, led: L, out: W, config: NormalizerConfig) -> Self {
        Self {
            decoder,
            led,
            out,
            normalizer: SignalNormalizer::new(config),
            indicator: LivenessIndicator::new(),
            led_on: None,
            stats: ReceiverStats::default(),
        }
    }

    /// One pass of the main loop: poll the decoder, emit an accepted code,
    /// refresh the LED. Returns the code written, if any.
    pub fn tick(&mut self, now_ms: u64) -> Result<Option<u32>, ReceiverError> {
        let mut emitted = None;
        if let Some(detection) = self.decoder.poll(now_ms) {
            match self.normalizer.process(&detection) {
                Verdict::Emit(code) => {
                    self.write(&format_code_line(code))?;
                    self.indicator.note_signal(now_ms);
                    self.stats.accepted += 1;
                    emitted = Some(code);
                }
                Verdict::Noise(noise) => {
                    trace!(protocol = %detection.protocol, code = detection.code, %noise, "dropped noise");
                    self.stats.noise += 1;
                }
                Verdict::Repeat => {
                    self.stats.repeats += 1;
                }
            }
        }
        self.refresh_led(now_ms);
        Ok(emitted)
    }

    /// Handles one byte from the host. Bytes that are not commands are ignored.
    pub fn handle_command_byte(&mut self, byte: u8, now_ms: u64) -> Result<(), ReceiverError> {
        match ReceiverCommand::from_byte(byte) {
            Some(ReceiverCommand::Status) => {
                let last = format_last_code_reply(self.normalizer.last_accepted());
                let status = format_status_reply(&self.status_text(now_ms));
                self.write(&last)?;
                self.write(&status)?;
            }
            Some(ReceiverCommand::Reset) => {
                debug!("reset requested");
                self.normalizer.clear();
                self.decoder.restart();
                self.write(&format!("{RESET_REPLY}\n"))?;
            }
            None => {}
        }
        Ok(())
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    /// The serial writer, e.g. to inspect what was sent in tests.
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn status_text(&self, now_ms: u64) -> String {
        let signal = match self.indicator.mode(now_ms) {
            IndicatorMode::Active => "active",
            IndicatorMode::SlowBlink => "idle",
        };
        format!(
            "signal={signal} accepted={} noise={} repeats={} window={}ms",
            self.stats.accepted,
            self.stats.noise,
            self.stats.repeats,
            self.normalizer.config().repeat_window_ms()
        )
    }

    fn refresh_led(&mut self, now_ms: u64) {
        let on = self.indicator.led_on(now_ms);
        if self.led_on != Some(on) {
            self.led.set(on);
            self.led_on = Some(on);
        }
    }

    fn write(&mut self, line: &str) -> Result<(), ReceiverError> {
        self.out.write_all(line.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
