//! Infrastructure layer for the host bridge.
//!
//! Contains OS-facing adapters: keyboard injection, the serial link to the
//! receiver, and on-disk storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `irkey_core`, but MUST NOT be imported by the `application` layer.
//!
//! # Sub-modules
//!
//! - **`injection`** – OS-specific implementations of `KeyboardInjector`,
//!   selected at compile time with `#[cfg(target_os)]`, plus a recording
//!   `MockInjector` for tests and `--dry-run`.
//!
//! - **`serial`** – Line reader over the receiver's serial port, status and
//!   reset commands, and reconnect backoff.
//!
//! - **`storage`** – `config.toml` and the profile directory.

pub mod injection;
pub mod serial;
pub mod storage;
