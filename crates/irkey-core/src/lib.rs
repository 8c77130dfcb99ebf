//! # irkey-core
//!
//! Shared library for IrKey containing the IR code representation, the
//! receiver's serial line protocol, key name and key code tables, and the
//! remote profile model.
//!
//! It is used by both the receiver firmware logic (`irkey-receiver`) and the
//! host bridge (`irkey-host`), and has no dependencies on OS APIs or I/O.
//!
//! # Architecture overview (for beginners)
//!
//! IrKey turns an infrared TV remote into a keyboard. A small receiver board
//! decodes IR light pulses into numbers, filters out noise and sends one text
//! line such as `0x08` over a serial (USB) link per button press. The host
//! program reads those lines, drops repeats, looks each code up in a
//! *profile* and presses the keyboard keys the profile names.
//!
//! This crate is the shared vocabulary of that pipeline:
//!
//! - **`code`** – [`NormalizedCode`], the one canonical spelling of an IR code
//!   (`"0x08"` → `"8"`), so profile keys and received codes always compare
//!   equal.
//!
//! - **`protocol`** – How lines travel over the serial link: the `0x%02X` code
//!   lines, the `S`/`R` command bytes and the `OK:`/`STATUS:`/`RST` replies.
//!
//! - **`keymap`** – [`HidKeyCode`], the platform-neutral key identity, plus the
//!   table translating key names (`"ctrl"`, `"page down"`) and platform key
//!   codes (X11 KeySyms, Windows VKs, macOS CGKeyCodes).
//!
//! - **`profile`** – [`Profile`] and [`ActionSpec`]: what each button does,
//!   loaded from validated JSON.

pub mod code;
pub mod keymap;
pub mod profile;
pub mod protocol;

pub use code::{CodeError, NormalizedCode};
pub use keymap::{HidKeyCode, KeyMapper};
pub use profile::{
    ActionSpec, ActionType, KeyMapping, Profile, ProfileError, SequenceStep, SpecialCommand,
};
pub use protocol::{ReceiverCommand, ReceiverLine};
