//! Key names and key code translation tables.
//!
//! The canonical representation is USB HID Usage IDs. Profile key names are
//! resolved to HID at load time; injection backends translate HID to the
//! platform code through [`KeyMapper`].

pub mod hid;
pub mod table;

pub use hid::HidKeyCode;

/// Unified key mapper providing all translation directions.
pub struct KeyMapper;

impl KeyMapper {
    /// Translates a [`HidKeyCode`] to a Windows Virtual Key code.
    ///
    /// Returns `None` if the HID code has no Windows VK equivalent.
    pub fn hid_to_windows_vk(hid: HidKeyCode) -> Option<u8> {
        table::entry_for(hid).and_then(|entry| entry.windows_vk)
    }

    /// Translates a [`HidKeyCode`] to an X11 KeySym value for Linux hosts.
    pub fn hid_to_x11_keysym(hid: HidKeyCode) -> Option<u32> {
        table::entry_for(hid).and_then(|entry| entry.x11_keysym)
    }

    /// Translates a [`HidKeyCode`] to a macOS `CGKeyCode` value.
    pub fn hid_to_macos_cgkeycode(hid: HidKeyCode) -> Option<u16> {
        table::entry_for(hid).and_then(|entry| entry.macos_cg)
    }

    /// Returns `true` when Windows needs `KEYEVENTF_EXTENDEDKEY` for this key.
    ///
    /// Covers the navigation cluster, the right-hand modifiers, the Windows
    /// keys and numpad Enter/Divide.
    pub fn is_windows_extended(hid: HidKeyCode) -> bool {
        matches!(
            hid,
            HidKeyCode::Insert
                | HidKeyCode::Delete
                | HidKeyCode::Home
                | HidKeyCode::End
                | HidKeyCode::PageUp
                | HidKeyCode::PageDown
                | HidKeyCode::ArrowLeft
                | HidKeyCode::ArrowRight
                | HidKeyCode::ArrowUp
                | HidKeyCode::ArrowDown
                | HidKeyCode::ControlRight
                | HidKeyCode::AltRight
                | HidKeyCode::MetaLeft
                | HidKeyCode::MetaRight
                | HidKeyCode::NumpadEnter
                | HidKeyCode::NumpadDivide
        )
    }
}
