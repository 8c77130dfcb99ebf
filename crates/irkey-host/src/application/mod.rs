//! Application layer use cases for the host bridge.
//!
//! # What use cases does the host have?
//!
//! - **`debounce`** – Turns the raw stream of received codes into discrete
//!   `Press` / `Hold` / `Release` button events using per-code timestamps.
//!
//! - **`mapper`** – Looks a code up in the active profile.  The active profile
//!   can be swapped from another thread without disturbing a running lookup.
//!
//! - **`execute_action`** – Performs an `ActionSpec` through an injected
//!   `KeyboardInjector` and keeps track of held keys so they are always
//!   released.
//!
//! - **`dispatch`** – The single dispatch loop tying the three together.
//!
//! - **`session`** – Runtime flags (ghost key, single tap) and the shared stop
//!   signal.

pub mod debounce;
pub mod dispatch;
pub mod execute_action;
pub mod mapper;
pub mod session;
