//! # irkey-receiver
//!
//! The logic that runs on the IR receiver board, written against two small
//! hardware traits so it can be tested on a desktop and ported to any board
//! with a serial port and an IR demodulator.
//!
//! - **`detection`** – [`RawDetection`], what the decoder reports per frame.
//! - **`normalizer`** – drops noise and collapses repeat frames into at most
//!   one code per repeat window.
//! - **`indicator`** – status LED: flash on activity, slow blink when idle.
//! - **`receiver`** – the main loop: writes `0x%02X` lines and answers the
//!   `S` (status) and `R` (reset) commands.

pub mod detection;
pub mod indicator;
pub mod normalizer;
pub mod receiver;

pub use detection::{IrProtocol, RawDetection};
pub use normalizer::{validate, DecodeNoise, NormalizerConfig, SignalNormalizer, Verdict};
pub use receiver::{IrDecoder, Receiver, ReceiverError, ReceiverStats, StatusLed};
