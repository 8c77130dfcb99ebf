//! Noise filtering and repeat suppression for raw decoder output.
//!
//! A held remote button retransmits every ~100 ms and cheap decoders also
//! report electrical garbage. The normalizer turns that into at most one
//! accepted code per repeat window:
//!
//! 1. **Validation** rejects detections that cannot be a real button:
//!    unknown protocol with a zero code, fewer than [`MIN_BITS`] bits, and the
//!    sentinel values `0x0`, [`JUNK_CODE`] and `0xFFFFFFFF`.
//! 2. **Repeat suppression** drops a code equal to the last accepted one until
//!    both the minimum interval and the repeat threshold have passed since it
//!    was accepted. Suppressed frames do not extend the window, so a held
//!    button comes through once per threshold.
//!
//! Host-side debouncing is authoritative; this filter only keeps the serial
//! link quiet.

use thiserror::Error;

use crate::detection::{IrProtocol, RawDetection};

/// Fewer bits than this is treated as noise.
pub const MIN_BITS: u8 = 8;

/// Code some decoders report for corrupted frames.
pub const JUNK_CODE: u32 = 0x4AB0_F7B6;

/// Codes that never come from a real button.
pub const SENTINEL_CODES: [u32; 3] = [0x0, JUNK_CODE, 0xFFFF_FFFF];

/// Timing for repeat suppression, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Hard floor between two emissions of the same code.
    pub min_interval_ms: u64,
    /// Window in which repeats of the same code collapse (150–300 ms is
    /// sensible for consumer remotes).
    pub repeat_threshold_ms: u64,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 50,
            repeat_threshold_ms: 200,
        }
    }
}

impl NormalizerConfig {
    /// The effective window for same-code repeats.
    pub fn repeat_window_ms(&self) -> u64 {
        self.min_interval_ms.max(self.repeat_threshold_ms)
    }
}

/// Why a detection was dropped as noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeNoise {
    #[error("unknown protocol with zero code")]
    UnknownZero,

    #[error("only {0} bits decoded")]
    TooFewBits(u8),

    #[error("sentinel value 0x{0:X}")]
    Sentinel(u32),
}

/// Checks whether a detection can be a real button press.
///
/// Pure: the same detection always yields the same verdict.
pub fn validate(detection: &RawDetection) -> Result<(), DecodeNoise> {
    if detection.protocol == IrProtocol::Unknown && detection.code == 0 {
        return Err(DecodeNoise::UnknownZero);
    }
    if detection.bits < MIN_BITS {
        return Err(DecodeNoise::TooFewBits(detection.bits));
    }
    if SENTINEL_CODES.contains(&detection.code) {
        return Err(DecodeNoise::Sentinel(detection.code));
    }
    Ok(())
}

/// Outcome of feeding one detection to the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Send this code to the host.
    Emit(u32),
    /// Dropped by validation.
    Noise(DecodeNoise),
    /// Same code inside the repeat window.
    Repeat,
}

/// Stateful filter over the detection stream.
#[derive(Debug, Default)]
pub struct SignalNormalizer {
    config: NormalizerConfig,
    /// Last accepted code and when it was accepted.
    last: Option<(u32, u64)>,
}

impl SignalNormalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config, last: None }
    }

    pub fn config(&self) -> NormalizerConfig {
        self.config
    }

    /// Validates and de-duplicates one detection.
    pub fn process(&mut self, detection: &RawDetection) -> Verdict {
        if let Err(noise) = validate(detection) {
            return Verdict::Noise(noise);
        }

        if let Some((code, accepted_at)) = self.last {
            let elapsed = detection.at_ms.saturating_sub(accepted_at);
            if code == detection.code && elapsed < self.config.repeat_window_ms() {
                return Verdict::Repeat;
            }
        }

        self.last = Some((detection.code, detection.at_ms));
        Verdict::Emit(detection.code)
    }

    /// The most recently accepted code.
    pub fn last_accepted(&self) -> Option<u32> {
        self.last.map(|(code, _)| code)
    }

    /// Forgets repeat tracking so the next detection is always accepted.
    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nec(code: u32, at_ms: u64) -> RawDetection {
        RawDetection::new(IrProtocol::Nec, code, 32, at_ms)
    }

    #[test]
    fn test_validate_rejects_unknown_protocol_with_zero_code() {
        let detection = RawDetection::new(IrProtocol::Unknown, 0, 32, 0);
        assert_eq!(validate(&detection), Err(DecodeNoise::UnknownZero));
    }

    #[test]
    fn test_validate_rejects_short_frames() {
        let detection = RawDetection::new(IrProtocol::Nec, 0x08, 7, 0);
        assert_eq!(validate(&detection), Err(DecodeNoise::TooFewBits(7)));
    }

    #[test]
    fn test_validate_rejects_sentinels() {
        for code in SENTINEL_CODES {
            // Arrange
            let detection = nec(code, 0);

            // Act / Assert
            assert_eq!(validate(&detection), Err(DecodeNoise::Sentinel(code)));
        }
    }

    #[test]
    fn test_validate_accepts_unknown_protocol_with_real_code() {
        let detection = RawDetection::new(IrProtocol::Unknown, 0x20DF_10EF, 32, 0);
        assert_eq!(validate(&detection), Ok(()));
    }

    #[test]
    fn test_emitted_codes_pass_validation_again_unchanged() {
        // Arrange
        let stream = [
            nec(0x08, 0),
            nec(0x08, 60),
            RawDetection::new(IrProtocol::Unknown, 0, 32, 80),
            nec(JUNK_CODE, 90),
            RawDetection::new(IrProtocol::Sony, 0x10, 4, 100),
            RawDetection::new(IrProtocol::Sony, 0x10, 12, 120),
            nec(0x08, 250),
            nec(0xFFFF_FFFF, 260),
            RawDetection::new(IrProtocol::Unknown, 0x20DF_10EF, 32, 300),
            nec(0x08, 480),
        ];
        let mut first_pass = SignalNormalizer::default();
        let emitted: Vec<RawDetection> = stream
            .iter()
            .filter_map(|d| match first_pass.process(d) {
                Verdict::Emit(code) => Some(RawDetection::new(d.protocol, code, d.bits, d.at_ms)),
                _ => None,
            })
            .collect();

        // Act
        let mut second_pass = SignalNormalizer::default();
        let reemitted: Vec<Verdict> = emitted.iter().map(|d| second_pass.process(d)).collect();

        // Assert
        assert_eq!(emitted.len(), 5);
        for detection in &emitted {
            assert_eq!(validate(detection), Ok(()), "{detection:?}");
        }
        let expected: Vec<Verdict> = emitted.iter().map(|d| Verdict::Emit(d.code)).collect();
        assert_eq!(reemitted, expected);
    }

    #[test]
    fn test_repeat_frames_collapse_within_threshold() {
        // Arrange
        let mut normalizer = SignalNormalizer::default();

        // Act
        let verdicts: Vec<Verdict> = [0, 60, 110, 190]
            .into_iter()
            .map(|at| normalizer.process(&nec(0x08, at)))
            .collect();

        // Assert
        assert_eq!(
            verdicts,
            vec![Verdict::Emit(0x08), Verdict::Repeat, Verdict::Repeat, Verdict::Repeat]
        );
    }

    #[test]
    fn test_held_button_passes_at_threshold_boundary() {
        // Arrange
        let mut normalizer = SignalNormalizer::default();
        normalizer.process(&nec(0x08, 0));

        // Act
        let at_boundary = normalizer.process(&nec(0x08, 200));
        let next_repeat = normalizer.process(&nec(0x08, 310));
        let next_window = normalizer.process(&nec(0x08, 400));

        // Assert
        assert_eq!(at_boundary, Verdict::Emit(0x08));
        assert_eq!(next_repeat, Verdict::Repeat);
        assert_eq!(next_window, Verdict::Emit(0x08));
    }

    #[test]
    fn test_different_code_is_emitted_immediately() {
        let mut normalizer = SignalNormalizer::default();
        normalizer.process(&nec(0x08, 0));

        assert_eq!(normalizer.process(&nec(0x09, 10)), Verdict::Emit(0x09));
        assert_eq!(normalizer.last_accepted(), Some(0x09));
    }

    #[test]
    fn test_min_interval_dominates_small_threshold() {
        // Arrange
        let mut normalizer = SignalNormalizer::new(NormalizerConfig {
            min_interval_ms: 50,
            repeat_threshold_ms: 0,
        });
        normalizer.process(&nec(0x08, 0));

        // Act / Assert
        assert_eq!(normalizer.process(&nec(0x08, 49)), Verdict::Repeat);
        assert_eq!(normalizer.process(&nec(0x08, 50)), Verdict::Emit(0x08));
    }

    #[test]
    fn test_noise_does_not_disturb_repeat_tracking() {
        let mut normalizer = SignalNormalizer::default();
        normalizer.process(&nec(0x08, 0));

        assert_eq!(
            normalizer.process(&nec(JUNK_CODE, 20)),
            Verdict::Noise(DecodeNoise::Sentinel(JUNK_CODE))
        );
        assert_eq!(normalizer.process(&nec(0x08, 40)), Verdict::Repeat);
    }

    #[test]
    fn test_clear_forgets_last_code() {
        let mut normalizer = SignalNormalizer::default();
        normalizer.process(&nec(0x08, 0));

        normalizer.clear();

        assert_eq!(normalizer.last_accepted(), None);
        assert_eq!(normalizer.process(&nec(0x08, 10)), Verdict::Emit(0x08));
    }
}
