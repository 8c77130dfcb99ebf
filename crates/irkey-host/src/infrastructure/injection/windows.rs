//! Windows keyboard injection via `SendInput`.
//!
//! Each transition is one `KEYBDINPUT` carrying the virtual-key code.  Keys
//! on the extended part of the keyboard (navigation cluster, right-hand
//! modifiers, Windows keys) also need `KEYEVENTF_EXTENDEDKEY`, otherwise
//! Windows treats e.g. Right Ctrl as Left Ctrl or an arrow as a numpad digit.

use irkey_core::{HidKeyCode, KeyMapper};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VIRTUAL_KEY,
};

use crate::application::execute_action::{InjectionError, KeyboardInjector};

#[derive(Debug, Default)]
pub struct SendInputInjector;

impl SendInputInjector {
    pub fn new() -> Self {
        Self
    }

    fn send(&self, key: HidKeyCode, key_up: bool) -> Result<(), InjectionError> {
        let vk = KeyMapper::hid_to_windows_vk(key).ok_or(InjectionError::UnsupportedKey(key))?;
        let mut flags = KEYBD_EVENT_FLAGS::default();
        if key_up {
            flags |= KEYEVENTF_KEYUP;
        }
        if KeyMapper::is_windows_extended(key) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }

        let input = INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(u16::from(vk)),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        };
        // SAFETY: `input` is a fully initialised KEYBDINPUT and the size
        // matches the INPUT struct.
        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent != 1 {
            return Err(InjectionError::Platform(format!(
                "SendInput inserted {sent} of 1 events for {key}"
            )));
        }
        Ok(())
    }
}

impl KeyboardInjector for SendInputInjector {
    fn key_down(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        self.send(key, false)
    }

    fn key_up(&self, key: HidKeyCode) -> Result<(), InjectionError> {
        self.send(key, true)
    }
}
