//! irkey-host library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does irkey-host do? (for beginners)
//!
//! An IR receiver (a microcontroller running `irkey-receiver`) is plugged
//! into this computer over USB serial.  Every time a remote button is pressed
//! it writes a line like `0x08`.  The host:
//!
//! 1. Reads those lines from the serial port and throws away anything that
//!    is not a well-formed code.
//! 2. Debounces: a held button produces a burst of identical codes, which is
//!    turned into one `Press` followed by occasional `Hold` events.
//! 3. Looks the code up in the active profile (a JSON file mapping codes to
//!    key actions).
//! 4. Injects the keys through the OS (`SendInput` on Windows, XTest on
//!    Linux, Core Graphics on macOS).
//!
//! The code is split into an `application` layer (pure logic with trait
//! seams) and an `infrastructure` layer (serial port, OS injection, files).

/// Application layer: debounce, mapping, action execution, dispatch loop.
pub mod application;

/// Infrastructure layer: serial link, keyboard backends, and storage.
pub mod infrastructure;
