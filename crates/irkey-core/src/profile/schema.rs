//! On-disk JSON shape of a profile and its conversion to validated types.
//!
//! ```json
//! {
//!   "name": "Living Room TV",
//!   "brand": "Vizio",
//!   "model": "XRT136",
//!   "mappings": {
//!     "FF": { "action_type": "combo", "keys": ["ctrl", "c"], "description": "Copy" },
//!     "EA": { "action_type": "sequence", "keys": ["windows", "a"], "delay_ms": 150 },
//!     "30": { "action_type": "special", "keys": "stop" }
//!   }
//! }
//! ```
//!
//! `keys` is either one string or a list. A sequence list entry may also be
//! `{"key": "a", "delay_ms": 250}` to override the delay after that step.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action::{
    ActionSpec, ActionType, SequenceStep, SpecialCommand, DEFAULT_SEQUENCE_DELAY, MAX_ACTION_DELAY,
};
use super::{KeyMapping, Profile, ProfileError};
use crate::code::NormalizedCode;
use crate::keymap::HidKeyCode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub name: String,
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub mappings: BTreeMap<String, MappingDocument>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDocument {
    pub action_type: ActionType,
    pub keys: KeysDocument,
    #[serde(default)]
    pub description: String,
    /// Single: how long to hold the key down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_ms: Option<u64>,
    /// Sequence: delay after every step without its own delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeysDocument {
    One(String),
    Many(Vec<KeyDocument>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyDocument {
    Name(String),
    Timed { key: String, delay_ms: u64 },
}

impl KeyDocument {
    fn name(&self) -> &str {
        match self {
            KeyDocument::Name(name) => name,
            KeyDocument::Timed { key, .. } => key,
        }
    }

    fn delay_ms(&self) -> Option<u64> {
        match self {
            KeyDocument::Name(_) => None,
            KeyDocument::Timed { delay_ms, .. } => Some(*delay_ms),
        }
    }
}

impl KeysDocument {
    fn entries(&self) -> Vec<KeyDocument> {
        match self {
            KeysDocument::One(name) => vec![KeyDocument::Name(name.clone())],
            KeysDocument::Many(entries) => entries.clone(),
        }
    }
}

// ── Document → Profile ───────────────────────────────────────────────────────

impl TryFrom<ProfileDocument> for Profile {
    type Error = ProfileError;

    fn try_from(doc: ProfileDocument) -> Result<Self, Self::Error> {
        if doc.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }

        let mut profile = Profile::new(doc.name, doc.brand);
        profile.model = doc.model.filter(|m| !m.trim().is_empty());
        profile.description = doc.description.filter(|d| !d.trim().is_empty());

        let mut raw_by_code: BTreeMap<NormalizedCode, String> = BTreeMap::new();
        for (raw, mapping_doc) in doc.mappings {
            let code = NormalizedCode::new(&raw).map_err(|source| ProfileError::InvalidCode {
                code: raw.clone(),
                source,
            })?;
            if let Some(first) = raw_by_code.get(&code) {
                return Err(ProfileError::DuplicateCode {
                    first: first.clone(),
                    second: raw,
                    code,
                });
            }
            let mapping = mapping_from_document(&code, mapping_doc)?;
            profile.insert(code.clone(), mapping);
            raw_by_code.insert(code, raw);
        }
        Ok(profile)
    }
}

fn resolve_key(code: &NormalizedCode, name: &str) -> Result<HidKeyCode, ProfileError> {
    HidKeyCode::from_name(name).ok_or_else(|| ProfileError::UnknownKey {
        code: code.clone(),
        key: name.to_string(),
    })
}

fn checked_delay(code: &NormalizedCode, millis: u64) -> Result<Duration, ProfileError> {
    let delay = Duration::from_millis(millis);
    if delay > MAX_ACTION_DELAY {
        return Err(ProfileError::DelayTooLong {
            code: code.clone(),
            millis,
        });
    }
    Ok(delay)
}

fn exactly_one<'a>(
    code: &NormalizedCode,
    action_type: ActionType,
    entries: &'a [KeyDocument],
) -> Result<&'a KeyDocument, ProfileError> {
    match entries {
        [only] => Ok(only),
        _ => Err(ProfileError::WrongKeyCount {
            code: code.clone(),
            action_type,
            count: entries.len(),
        }),
    }
}

fn mapping_from_document(
    code: &NormalizedCode,
    doc: MappingDocument,
) -> Result<KeyMapping, ProfileError> {
    let entries: Vec<KeyDocument> = doc
        .keys
        .entries()
        .into_iter()
        .filter(|entry| !entry.name().trim().is_empty())
        .collect();
    if entries.is_empty() {
        return Err(ProfileError::EmptyKeys { code: code.clone() });
    }

    let action = match doc.action_type {
        ActionType::Single => {
            let entry = exactly_one(code, ActionType::Single, &entries)?;
            let hold = match doc.hold_ms.filter(|ms| *ms > 0) {
                Some(ms) => Some(checked_delay(code, ms)?),
                None => None,
            };
            ActionSpec::Single {
                key: resolve_key(code, entry.name())?,
                hold,
            }
        }
        ActionType::Combo => {
            let mut keys = Vec::with_capacity(entries.len());
            for entry in &entries {
                let key = resolve_key(code, entry.name())?;
                if keys.contains(&key) {
                    return Err(ProfileError::DuplicateKey {
                        code: code.clone(),
                        key,
                    });
                }
                keys.push(key);
            }
            ActionSpec::Combo(keys)
        }
        ActionType::Sequence => {
            let default_delay = match doc.delay_ms {
                Some(ms) => checked_delay(code, ms)?,
                None => DEFAULT_SEQUENCE_DELAY,
            };
            let steps = entries
                .iter()
                .map(|entry| {
                    let delay = match entry.delay_ms() {
                        Some(ms) => checked_delay(code, ms)?,
                        None => default_delay,
                    };
                    Ok(SequenceStep {
                        key: resolve_key(code, entry.name())?,
                        delay,
                    })
                })
                .collect::<Result<Vec<_>, ProfileError>>()?;
            ActionSpec::Sequence(steps)
        }
        ActionType::Special => {
            let entry = exactly_one(code, ActionType::Special, &entries)?;
            let command = entry.name().parse::<SpecialCommand>().map_err(|()| {
                ProfileError::UnknownSpecial {
                    code: code.clone(),
                    token: entry.name().to_string(),
                }
            })?;
            ActionSpec::Special(command)
        }
    };

    Ok(KeyMapping {
        action,
        description: doc.description,
    })
}

// ── Profile → Document ───────────────────────────────────────────────────────

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn mapping_to_document(mapping: &KeyMapping) -> MappingDocument {
    let mut doc = MappingDocument {
        action_type: mapping.action.action_type(),
        keys: KeysDocument::Many(Vec::new()),
        description: mapping.description.clone(),
        hold_ms: None,
        delay_ms: None,
    };

    match &mapping.action {
        ActionSpec::Single { key, hold } => {
            doc.keys = KeysDocument::One(key.name().to_string());
            doc.hold_ms = hold.map(millis);
        }
        ActionSpec::Combo(keys) => {
            doc.keys = KeysDocument::Many(
                keys.iter()
                    .map(|k| KeyDocument::Name(k.name().to_string()))
                    .collect(),
            );
        }
        ActionSpec::Sequence(steps) => {
            // One shared delay is written as `delay_ms`; anything else per step.
            let shared = steps
                .first()
                .map(|s| s.delay)
                .filter(|first| steps.iter().all(|s| s.delay == *first));
            let step_default = shared.unwrap_or(DEFAULT_SEQUENCE_DELAY);
            if let Some(delay) = shared.filter(|d| *d != DEFAULT_SEQUENCE_DELAY) {
                doc.delay_ms = Some(millis(delay));
            }
            doc.keys = KeysDocument::Many(
                steps
                    .iter()
                    .map(|step| {
                        if step.delay == step_default {
                            KeyDocument::Name(step.key.name().to_string())
                        } else {
                            KeyDocument::Timed {
                                key: step.key.name().to_string(),
                                delay_ms: millis(step.delay),
                            }
                        }
                    })
                    .collect(),
            );
        }
        ActionSpec::Special(cmd) => {
            doc.keys = KeysDocument::One(cmd.token().to_string());
        }
    }
    doc
}

impl From<Profile> for ProfileDocument {
    fn from(profile: Profile) -> Self {
        let mappings = profile
            .mappings()
            .map(|(code, mapping)| (code.to_string(), mapping_to_document(mapping)))
            .collect();
        ProfileDocument {
            name: profile.name,
            brand: profile.brand,
            model: profile.model,
            description: profile.description,
            mappings,
        }
    }
}
