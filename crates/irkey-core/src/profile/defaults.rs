//! Built-in profiles.

use super::action::{ActionSpec, SequenceStep, SpecialCommand, DEFAULT_SEQUENCE_DELAY};
use super::{KeyMapping, Profile};
use crate::code::NormalizedCode;
use crate::keymap::HidKeyCode::{self, *};

fn combo(keys: &[HidKeyCode]) -> ActionSpec {
    ActionSpec::Combo(keys.to_vec())
}

fn single(key: HidKeyCode) -> ActionSpec {
    ActionSpec::Single { key, hold: None }
}

fn sequence(keys: &[HidKeyCode]) -> ActionSpec {
    ActionSpec::Sequence(
        keys.iter()
            .map(|&key| SequenceStep {
                key,
                delay: DEFAULT_SEQUENCE_DELAY,
            })
            .collect(),
    )
}

/// Stock Vizio TV remote: media buttons drive browser/streaming-app
/// shortcuts, digits type digits, and three buttons control IrKey itself.
pub(super) fn vizio_remote() -> Profile {
    let bindings: Vec<(u32, ActionSpec, &str)> = vec![
        (0x08, combo(&[ControlLeft, KeyA]), "Power button"),
        (0x2F, combo(&[ControlLeft, KeyA]), "Input button"),
        (0xEA, sequence(&[MetaLeft, KeyA]), "Amazon button"),
        (0xEB, combo(&[KeyN]), "Netflix button"),
        (0xEE, combo(&[KeyI]), "iHeart button"),
        (0x35, combo(&[ControlLeft, Backspace]), "Rewind"),
        (0x37, combo(&[ControlLeft, KeyA]), "Pause"),
        (0x33, combo(&[ControlLeft, KeyA]), "Play"),
        (0x36, combo(&[ControlLeft, KeyA]), "Fast Forward"),
        (0x30, ActionSpec::Special(SpecialCommand::Stop), "Stop controller"),
        (0x45, combo(&[ControlLeft, ArrowUp]), "Up arrow"),
        (0x46, combo(&[ControlLeft, ArrowDown]), "Down arrow"),
        (0x47, combo(&[ControlLeft, ArrowLeft]), "Left arrow"),
        (0x48, combo(&[ControlLeft, ArrowRight]), "Right arrow"),
        (0x44, combo(&[ControlLeft, Enter]), "Select/OK"),
        (0x02, combo(&[VolumeUp]), "Volume Up"),
        (0x03, combo(&[VolumeDown]), "Volume Down"),
        (0x2D, combo(&[ControlLeft, Home]), "Home"),
        (0x00, combo(&[ControlLeft, PageUp]), "Channel Up"),
        (0x01, combo(&[ControlLeft, PageDown]), "Channel Down"),
        (0x09, combo(&[ControlLeft, KeyF]), "Mute"),
        (0x11, single(Digit1), "Number 1"),
        (0x12, single(Digit2), "Number 2"),
        (0x13, single(Digit3), "Number 3"),
        (0x14, single(Digit4), "Number 4"),
        (0x15, single(Digit5), "Number 5"),
        (0x16, single(Digit6), "Number 6"),
        (0x17, single(Digit7), "Number 7"),
        (0x18, single(Digit8), "Number 8"),
        (0x19, single(Digit9), "Number 9"),
        (0x10, single(Digit0), "Number 0"),
        (0x3A, single(Enter), "Enter"),
        (0x1A, ActionSpec::Special(SpecialCommand::ToggleTap), "Toggle single tap mode"),
        (0xFF, ActionSpec::Special(SpecialCommand::ToggleGhost), "Toggle ghost key"),
    ];

    let mut profile = Profile::new("Default Vizio Remote", "Vizio");
    profile.model = Some("Generic TV Remote".to_string());
    profile.description = Some("Default configuration for Vizio TV remote".to_string());
    for (code, action, description) in bindings {
        profile.insert(
            NormalizedCode::from_value(code),
            KeyMapping::new(action, description),
        );
    }
    profile
}
