//! What a mapped button does.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::keymap::HidKeyCode;

/// Delay after each sequence step when a profile does not give one.
pub const DEFAULT_SEQUENCE_DELAY: Duration = Duration::from_millis(100);

/// Longest hold or step delay a profile may declare.
pub const MAX_ACTION_DELAY: Duration = Duration::from_secs(10);

/// The four action kinds a profile entry can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Single,
    Combo,
    Sequence,
    Special,
}

/// Commands that act on the dispatch session instead of the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialCommand {
    /// Release everything and end the dispatch loop.
    Stop,
    /// Flip ghost-key injection on or off.
    ToggleGhost,
    /// Flip single-tap mode on or off.
    ToggleTap,
    /// Flip auto-repeat of held buttons on or off.
    ToggleRepeat,
}

impl SpecialCommand {
    /// The token used in profile files.
    pub fn token(self) -> &'static str {
        match self {
            SpecialCommand::Stop => "stop",
            SpecialCommand::ToggleGhost => "toggle_ghost",
            SpecialCommand::ToggleTap => "toggle_tap",
            SpecialCommand::ToggleRepeat => "toggle_repeat",
        }
    }
}

impl fmt::Display for SpecialCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for SpecialCommand {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stop" => Ok(SpecialCommand::Stop),
            "toggle_ghost" => Ok(SpecialCommand::ToggleGhost),
            "toggle_tap" => Ok(SpecialCommand::ToggleTap),
            "toggle_repeat" => Ok(SpecialCommand::ToggleRepeat),
            _ => Err(()),
        }
    }
}

/// One step of a sequence: tap `key`, then wait `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceStep {
    pub key: HidKeyCode,
    pub delay: Duration,
}

/// A resolved, validated action.
///
/// Construction goes through profile loading, which guarantees every variant
/// carries at least one key and that combo keys are distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSpec {
    /// Press, optionally hold, release.
    Single {
        key: HidKeyCode,
        hold: Option<Duration>,
    },
    /// Press all keys in order, release in reverse order.
    Combo(Vec<HidKeyCode>),
    /// Tap each key in turn, waiting after each.
    Sequence(Vec<SequenceStep>),
    Special(SpecialCommand),
}

impl ActionSpec {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionSpec::Single { .. } => ActionType::Single,
            ActionSpec::Combo(_) => ActionType::Combo,
            ActionSpec::Sequence(_) => ActionType::Sequence,
            ActionSpec::Special(_) => ActionType::Special,
        }
    }

    /// Every key the action touches, in execution order.
    pub fn keys(&self) -> Vec<HidKeyCode> {
        match self {
            ActionSpec::Single { key, .. } => vec![*key],
            ActionSpec::Combo(keys) => keys.clone(),
            ActionSpec::Sequence(steps) => steps.iter().map(|step| step.key).collect(),
            ActionSpec::Special(_) => Vec::new(),
        }
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |keys: &[HidKeyCode], sep: &str| {
            keys.iter().map(|k| k.name()).collect::<Vec<_>>().join(sep)
        };
        match self {
            ActionSpec::Single { key, hold: None } => write!(f, "{key}"),
            ActionSpec::Single { key, hold: Some(hold) } => {
                write!(f, "{key} (hold {}ms)", hold.as_millis())
            }
            ActionSpec::Combo(keys) => f.write_str(&join(keys, "+")),
            ActionSpec::Sequence(_) => f.write_str(&join(&self.keys(), ", ")),
            ActionSpec::Special(cmd) => write!(f, "special:{cmd}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_tokens_parse_case_insensitively() {
        assert_eq!("STOP".parse(), Ok(SpecialCommand::Stop));
        assert_eq!(" toggle_ghost ".parse(), Ok(SpecialCommand::ToggleGhost));
        assert_eq!("toggle_tap".parse(), Ok(SpecialCommand::ToggleTap));
        assert_eq!("Toggle_Repeat".parse(), Ok(SpecialCommand::ToggleRepeat));
        assert_eq!("reboot".parse::<SpecialCommand>(), Err(()));
    }

    #[test]
    fn test_display_renders_combo_with_plus() {
        // Arrange
        let action = ActionSpec::Combo(vec![HidKeyCode::ControlLeft, HidKeyCode::KeyC]);

        // Act / Assert
        assert_eq!(action.to_string(), "ctrl+c");
        assert_eq!(action.action_type(), ActionType::Combo);
    }

    #[test]
    fn test_keys_lists_sequence_in_order() {
        let action = ActionSpec::Sequence(vec![
            SequenceStep { key: HidKeyCode::MetaLeft, delay: DEFAULT_SEQUENCE_DELAY },
            SequenceStep { key: HidKeyCode::KeyA, delay: DEFAULT_SEQUENCE_DELAY },
        ]);
        assert_eq!(action.keys(), vec![HidKeyCode::MetaLeft, HidKeyCode::KeyA]);
    }
}
