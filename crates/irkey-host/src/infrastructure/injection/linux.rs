//! Linux X11 keyboard injection via the XTest extension.
//!
//! # What is XTest? (for beginners)
//!
//! XTest is an X11 protocol extension that lets a process synthesize input
//! as if it came from real hardware.  The focused window cannot tell the
//! difference.
//!
//! `XTestFakeKeyEvent` takes an X11 *keycode*, not a KeySym, so each key goes
//! through two lookups:
//!
//! ```text
//! HidKeyCode → X11 KeySym (KeyMapper) → XKeysymToKeycode(display, keysym) → keycode
//! ```
//!
//! # Permissions
//!
//! The process needs access to the display named by `DISPLAY`.  If it is
//! unset or the server refuses the connection, [`XTestInjector::new`] fails.

use std::ptr::{self, NonNull};
use std::sync::{Mutex, PoisonError};

use irkey_core::{HidKeyCode, KeyMapper};
use tracing::debug;
use x11::xlib::{self, Display};
use x11::xtest;

use crate::application::execute_action::{InjectionError, KeyboardInjector};

/// `CurrentTime`: deliver the event immediately.
const CURRENT_TIME: std::os::raw::c_ulong = 0;

struct DisplayHandle(NonNull<Display>);

// SAFETY: the display pointer is only dereferenced by Xlib while the owning
// `Mutex` is held, so calls are serialized.
unsafe impl Send for DisplayHandle {}

pub struct XTestInjector {
    display: Mutex<DisplayHandle>,
}

impl XTestInjector {
    /// Opens the default X display.
    ///
    /// # Errors
    ///
    /// `InjectionError::Platform` if `XOpenDisplay` returns null.
    pub fn new() -> Result<Self, InjectionError> {
        // SAFETY: a null name selects the display from `DISPLAY`.
        let raw = unsafe { xlib::XOpenDisplay(ptr::null()) };
        let display = NonNull::new(raw)
            .ok_or_else(|| InjectionError::Platform("cannot open X display".to_string()))?;
        debug!("opened X display for XTest injection");
        Ok(Self {
            display: Mutex::new(DisplayHandle(display)),
        })
    }

    fn send(&self, key: HidKeyCode, press: bool) -> Result<(), InjectionError> {
        let keysym = KeyMapper::hid_to_x11_keysym(key).ok_or(InjectionError::UnsupportedKey(key))?;
        let handle = self.display.lock().unwrap_or_else(PoisonError::into_inner);
        let display = handle.0.as_ptr();
        // SAFETY: `display` came from a successful XOpenDisplay and is not
        // closed until drop; the lock serializes access.
        unsafe {
            let keycode = xlib::XKeysymToKeycode(display, xlib::KeySym::from(keysym));
            if keycode == 0 {
                return Err(InjectionError::UnsupportedKey(key));
            }
            let is_press = if press { xlib::True } else { xlib::False };
            if xtest::XTestFakeKeyEvent(display, u32::from(keycode), is_press, CURRENT_TIME) == 0 {
                return Err(InjectionError::Platform(format!(
                    "XTestFakeKeyEvent rejected {key}"
                )));
            }
            xlib::XFlush(display);
        }
        Ok(())
    }
}

impl KeyboardInjector for XTestInjector {
    fn key_down(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        self.send(key, true)
    }

    fn key_up(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        self.send(key, false)
    }
}

impl Drop for XTestInjector {
    fn drop(&mut self) {
        let handle = self.display.get_mut().unwrap_or_else(PoisonError::into_inner);
        // SAFETY: the pointer is valid and no other reference remains.
        unsafe {
            xlib::XCloseDisplay(handle.0.as_ptr());
        }
    }
}
