//! The key table: one row per [`HidKeyCode`] carrying its profile names and
//! its code on every injection platform.
//!
//! Platform references:
//! - X11 KeySyms: `X11/keysymdef.h` and `X11/XF86keysym.h` (letters use the
//!   lowercase KeySym; XTest applies Shift itself).
//! - Windows Virtual Keys: <https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes>
//! - macOS `CGKeyCode`: `HIToolbox/Events.h` (`kVK_*`).

use super::hid::HidKeyCode;

/// One row of the key table.
#[derive(Debug, Clone, Copy)]
pub struct KeyEntry {
    pub hid: HidKeyCode,
    /// Canonical profile name (lowercase).
    pub name: &'static str,
    /// Additional accepted profile names (lowercase).
    pub aliases: &'static [&'static str],
    pub x11_keysym: Option<u32>,
    pub windows_vk: Option<u8>,
    pub macos_cg: Option<u16>,
}

const fn key(
    hid: HidKeyCode,
    name: &'static str,
    aliases: &'static [&'static str],
    x11_keysym: Option<u32>,
    windows_vk: Option<u8>,
    macos_cg: Option<u16>,
) -> KeyEntry {
    KeyEntry {
        hid,
        name,
        aliases,
        x11_keysym,
        windows_vk,
        macos_cg,
    }
}

use HidKeyCode::*;

pub const KEY_TABLE: &[KeyEntry] = &[
    // ── Letters ──────────────────────────────────────────────────────────────
    key(KeyA, "a", &[], Some(0x0061), Some(0x41), Some(0x00)),
    key(KeyB, "b", &[], Some(0x0062), Some(0x42), Some(0x0B)),
    key(KeyC, "c", &[], Some(0x0063), Some(0x43), Some(0x08)),
    key(KeyD, "d", &[], Some(0x0064), Some(0x44), Some(0x02)),
    key(KeyE, "e", &[], Some(0x0065), Some(0x45), Some(0x0E)),
    key(KeyF, "f", &[], Some(0x0066), Some(0x46), Some(0x03)),
    key(KeyG, "g", &[], Some(0x0067), Some(0x47), Some(0x05)),
    key(KeyH, "h", &[], Some(0x0068), Some(0x48), Some(0x04)),
    key(KeyI, "i", &[], Some(0x0069), Some(0x49), Some(0x22)),
    key(KeyJ, "j", &[], Some(0x006A), Some(0x4A), Some(0x26)),
    key(KeyK, "k", &[], Some(0x006B), Some(0x4B), Some(0x28)),
    key(KeyL, "l", &[], Some(0x006C), Some(0x4C), Some(0x25)),
    key(KeyM, "m", &[], Some(0x006D), Some(0x4D), Some(0x2E)),
    key(KeyN, "n", &[], Some(0x006E), Some(0x4E), Some(0x2D)),
    key(KeyO, "o", &[], Some(0x006F), Some(0x4F), Some(0x1F)),
    key(KeyP, "p", &[], Some(0x0070), Some(0x50), Some(0x23)),
    key(KeyQ, "q", &[], Some(0x0071), Some(0x51), Some(0x0C)),
    key(KeyR, "r", &[], Some(0x0072), Some(0x52), Some(0x0F)),
    key(KeyS, "s", &[], Some(0x0073), Some(0x53), Some(0x01)),
    key(KeyT, "t", &[], Some(0x0074), Some(0x54), Some(0x11)),
    key(KeyU, "u", &[], Some(0x0075), Some(0x55), Some(0x20)),
    key(KeyV, "v", &[], Some(0x0076), Some(0x56), Some(0x09)),
    key(KeyW, "w", &[], Some(0x0077), Some(0x57), Some(0x0D)),
    key(KeyX, "x", &[], Some(0x0078), Some(0x58), Some(0x07)),
    key(KeyY, "y", &[], Some(0x0079), Some(0x59), Some(0x10)),
    key(KeyZ, "z", &[], Some(0x007A), Some(0x5A), Some(0x06)),
    // ── Digit row ────────────────────────────────────────────────────────────
    key(Digit1, "1", &[], Some(0x0031), Some(0x31), Some(0x12)),
    key(Digit2, "2", &[], Some(0x0032), Some(0x32), Some(0x13)),
    key(Digit3, "3", &[], Some(0x0033), Some(0x33), Some(0x14)),
    key(Digit4, "4", &[], Some(0x0034), Some(0x34), Some(0x15)),
    key(Digit5, "5", &[], Some(0x0035), Some(0x35), Some(0x17)),
    key(Digit6, "6", &[], Some(0x0036), Some(0x36), Some(0x16)),
    key(Digit7, "7", &[], Some(0x0037), Some(0x37), Some(0x1A)),
    key(Digit8, "8", &[], Some(0x0038), Some(0x38), Some(0x1C)),
    key(Digit9, "9", &[], Some(0x0039), Some(0x39), Some(0x19)),
    key(Digit0, "0", &[], Some(0x0030), Some(0x30), Some(0x1D)),
    // ── Control keys ─────────────────────────────────────────────────────────
    key(Enter, "enter", &["return"], Some(0xFF0D), Some(0x0D), Some(0x24)),
    key(Escape, "esc", &["escape"], Some(0xFF1B), Some(0x1B), Some(0x35)),
    key(Backspace, "backspace", &["back"], Some(0xFF08), Some(0x08), Some(0x33)),
    key(Tab, "tab", &[], Some(0xFF09), Some(0x09), Some(0x30)),
    key(Space, "space", &["spacebar"], Some(0x0020), Some(0x20), Some(0x31)),
    key(CapsLock, "caps lock", &["capslock"], Some(0xFFE5), Some(0x14), Some(0x39)),
    // ── Punctuation ──────────────────────────────────────────────────────────
    key(Minus, "-", &["minus"], Some(0x002D), Some(0xBD), Some(0x1B)),
    key(Equal, "=", &["equal", "equals"], Some(0x003D), Some(0xBB), Some(0x18)),
    key(BracketLeft, "[", &[], Some(0x005B), Some(0xDB), Some(0x21)),
    key(BracketRight, "]", &[], Some(0x005D), Some(0xDD), Some(0x1E)),
    key(Backslash, "\\", &["backslash"], Some(0x005C), Some(0xDC), Some(0x2A)),
    key(Semicolon, ";", &["semicolon"], Some(0x003B), Some(0xBA), Some(0x29)),
    key(Quote, "'", &["quote"], Some(0x0027), Some(0xDE), Some(0x27)),
    key(Backquote, "`", &["grave"], Some(0x0060), Some(0xC0), Some(0x32)),
    key(Comma, ",", &["comma"], Some(0x002C), Some(0xBC), Some(0x2B)),
    key(Period, ".", &["period"], Some(0x002E), Some(0xBE), Some(0x2F)),
    key(Slash, "/", &["slash"], Some(0x002F), Some(0xBF), Some(0x2C)),
    // ── Function keys ────────────────────────────────────────────────────────
    key(F1, "f1", &[], Some(0xFFBE), Some(0x70), Some(0x7A)),
    key(F2, "f2", &[], Some(0xFFBF), Some(0x71), Some(0x78)),
    key(F3, "f3", &[], Some(0xFFC0), Some(0x72), Some(0x63)),
    key(F4, "f4", &[], Some(0xFFC1), Some(0x73), Some(0x76)),
    key(F5, "f5", &[], Some(0xFFC2), Some(0x74), Some(0x60)),
    key(F6, "f6", &[], Some(0xFFC3), Some(0x75), Some(0x61)),
    key(F7, "f7", &[], Some(0xFFC4), Some(0x76), Some(0x62)),
    key(F8, "f8", &[], Some(0xFFC5), Some(0x77), Some(0x64)),
    key(F9, "f9", &[], Some(0xFFC6), Some(0x78), Some(0x65)),
    key(F10, "f10", &[], Some(0xFFC7), Some(0x79), Some(0x6D)),
    key(F11, "f11", &[], Some(0xFFC8), Some(0x7A), Some(0x67)),
    key(F12, "f12", &[], Some(0xFFC9), Some(0x7B), Some(0x6F)),
    // ── Navigation cluster ───────────────────────────────────────────────────
    key(PrintScreen, "print screen", &["printscreen", "prtsc"], Some(0xFF61), Some(0x2C), Some(0x69)),
    key(ScrollLock, "scroll lock", &["scrolllock"], Some(0xFF14), Some(0x91), Some(0x6B)),
    key(Pause, "pause", &["break"], Some(0xFF13), Some(0x13), Some(0x71)),
    key(Insert, "insert", &["ins"], Some(0xFF63), Some(0x2D), Some(0x72)),
    key(Home, "home", &[], Some(0xFF50), Some(0x24), Some(0x73)),
    key(PageUp, "page up", &["pageup", "pgup"], Some(0xFF55), Some(0x21), Some(0x74)),
    key(Delete, "delete", &["del"], Some(0xFFFF), Some(0x2E), Some(0x75)),
    key(End, "end", &[], Some(0xFF57), Some(0x23), Some(0x77)),
    key(PageDown, "page down", &["pagedown", "pgdn"], Some(0xFF56), Some(0x22), Some(0x79)),
    key(ArrowRight, "right", &["right arrow"], Some(0xFF53), Some(0x27), Some(0x7C)),
    key(ArrowLeft, "left", &["left arrow"], Some(0xFF51), Some(0x25), Some(0x7B)),
    key(ArrowDown, "down", &["down arrow"], Some(0xFF54), Some(0x28), Some(0x7D)),
    key(ArrowUp, "up", &["up arrow"], Some(0xFF52), Some(0x26), Some(0x7E)),
    // ── Numpad ───────────────────────────────────────────────────────────────
    key(NumLock, "num lock", &["numlock"], Some(0xFF7F), Some(0x90), Some(0x47)),
    key(NumpadDivide, "num /", &[], Some(0xFFAF), Some(0x6F), Some(0x4B)),
    key(NumpadMultiply, "num *", &[], Some(0xFFAA), Some(0x6A), Some(0x43)),
    key(NumpadSubtract, "num -", &[], Some(0xFFAD), Some(0x6D), Some(0x4E)),
    key(NumpadAdd, "num +", &[], Some(0xFFAB), Some(0x6B), Some(0x45)),
    // VK_RETURN with the extended flag; the Windows backend sets it.
    key(NumpadEnter, "num enter", &[], Some(0xFF8D), Some(0x0D), Some(0x4C)),
    key(Numpad1, "num 1", &[], Some(0xFFB1), Some(0x61), Some(0x53)),
    key(Numpad2, "num 2", &[], Some(0xFFB2), Some(0x62), Some(0x54)),
    key(Numpad3, "num 3", &[], Some(0xFFB3), Some(0x63), Some(0x55)),
    key(Numpad4, "num 4", &[], Some(0xFFB4), Some(0x64), Some(0x56)),
    key(Numpad5, "num 5", &[], Some(0xFFB5), Some(0x65), Some(0x57)),
    key(Numpad6, "num 6", &[], Some(0xFFB6), Some(0x66), Some(0x58)),
    key(Numpad7, "num 7", &[], Some(0xFFB7), Some(0x67), Some(0x59)),
    key(Numpad8, "num 8", &[], Some(0xFFB8), Some(0x68), Some(0x5B)),
    key(Numpad9, "num 9", &[], Some(0xFFB9), Some(0x69), Some(0x5C)),
    key(Numpad0, "num 0", &[], Some(0xFFB0), Some(0x60), Some(0x52)),
    key(NumpadDecimal, "num .", &[], Some(0xFFAE), Some(0x6E), Some(0x41)),
    // macOS has no menu key.
    key(ContextMenu, "menu", &["apps", "application"], Some(0xFF67), Some(0x5D), None),
    // ── Volume ───────────────────────────────────────────────────────────────
    key(VolumeMute, "volume mute", &["mute"], Some(0x1008_FF12), Some(0xAD), Some(0x4A)),
    key(VolumeUp, "volume up", &[], Some(0x1008_FF13), Some(0xAF), Some(0x48)),
    key(VolumeDown, "volume down", &[], Some(0x1008_FF11), Some(0xAE), Some(0x49)),
    // ── Modifiers ────────────────────────────────────────────────────────────
    key(ControlLeft, "ctrl", &["control", "left ctrl", "lctrl"], Some(0xFFE3), Some(0xA2), Some(0x3B)),
    key(ShiftLeft, "shift", &["left shift", "lshift"], Some(0xFFE1), Some(0xA0), Some(0x38)),
    key(AltLeft, "alt", &["left alt", "lalt", "option"], Some(0xFFE9), Some(0xA4), Some(0x3A)),
    key(
        MetaLeft,
        "windows",
        &["win", "left windows", "super", "cmd", "command", "meta"],
        Some(0xFFEB),
        Some(0x5B),
        Some(0x37),
    ),
    key(ControlRight, "right ctrl", &["rctrl"], Some(0xFFE4), Some(0xA3), Some(0x3E)),
    key(ShiftRight, "right shift", &["rshift"], Some(0xFFE2), Some(0xA1), Some(0x3C)),
    key(AltRight, "right alt", &["alt gr", "altgr", "ralt"], Some(0xFFEA), Some(0xA5), Some(0x3D)),
    key(MetaRight, "right windows", &["right win", "right cmd"], Some(0xFFEC), Some(0x5C), Some(0x36)),
];

/// Returns the table row for `hid`.
pub fn entry_for(hid: HidKeyCode) -> Option<&'static KeyEntry> {
    KEY_TABLE.iter().find(|entry| entry.hid == hid)
}

/// Returns the table row matching a profile key name or alias.
pub fn entry_for_name(name: &str) -> Option<&'static KeyEntry> {
    let wanted = normalize_name(name);
    if wanted.is_empty() {
        return None;
    }
    KEY_TABLE
        .iter()
        .find(|entry| entry.name == wanted || entry.aliases.contains(&wanted.as_str()))
}

/// Lowercases, trims and collapses `_`/whitespace runs into single spaces.
///
/// Single-character names are left alone so `"_"`-like punctuation would
/// still be matched literally.
fn normalize_name(name: &str) -> String {
    let trimmed = name.trim().to_lowercase();
    if trimmed.chars().count() <= 1 {
        return trimmed;
    }
    trimmed
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
