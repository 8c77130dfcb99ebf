//! macOS keyboard injection via Core Graphics events.
//!
//! Events are posted at the HID tap location so they pass through the same
//! path as hardware input.  The process must be granted Accessibility access
//! (System Settings → Privacy & Security → Accessibility) or the events are
//! silently discarded by the OS.

use core_graphics::event::{CGEvent, CGEventTapLocation};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use irkey_core::{HidKeyCode, KeyMapper};

use crate::application::execute_action::{InjectionError, KeyboardInjector};

#[derive(Debug)]
pub struct CgEventInjector;

impl CgEventInjector {
    /// Checks that an event source can be created.
    ///
    /// # Errors
    ///
    /// `InjectionError::Platform` when Core Graphics refuses.
    pub fn new() -> Result<Self, InjectionError> {
        source()?;
        Ok(Self)
    }

    fn send(&self, key: HidKeyCode, down: bool) -> Result<(), InjectionError> {
        let keycode =
            KeyMapper::hid_to_macos_cgkeycode(key).ok_or(InjectionError::UnsupportedKey(key))?;
        let event = CGEvent::new_keyboard_event(source()?, keycode, down).map_err(|()| {
            InjectionError::Platform(format!("cannot create keyboard event for {key}"))
        })?;
        event.post(CGEventTapLocation::HID);
        Ok(())
    }
}

fn source() -> Result<CGEventSource, InjectionError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|()| InjectionError::Platform("cannot create CGEventSource".to_string()))
}

impl KeyboardInjector for CgEventInjector {
    fn key_down(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        self.send(key, true)
    }

    fn key_up(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        self.send(key, false)
    }
}
