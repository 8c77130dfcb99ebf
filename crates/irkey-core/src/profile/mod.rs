//! Remote profiles: a named table from IR code to keyboard action.
//!
//! A [`Profile`] only exists in validated form. Loading JSON goes through
//! [`schema::ProfileDocument`] and every entry is checked on the way in:
//! unknown key names, empty key lists, unknown special tokens and codes that
//! collide after normalization are rejected with a [`ProfileError`]. After
//! that, the dispatcher can execute any mapping without further checks.

pub mod action;
mod defaults;
pub mod schema;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::code::{CodeError, NormalizedCode};
use crate::keymap::HidKeyCode;

pub use action::{
    ActionSpec, ActionType, SequenceStep, SpecialCommand, DEFAULT_SEQUENCE_DELAY, MAX_ACTION_DELAY,
};
pub use schema::ProfileDocument;

/// Validation failures while building a profile from its file form.
#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("profile name is empty")]
    EmptyName,

    #[error("invalid IR code {code:?}: {source}")]
    InvalidCode {
        code: String,
        #[source]
        source: CodeError,
    },

    #[error("IR codes {first:?} and {second:?} both normalize to {code}")]
    DuplicateCode {
        first: String,
        second: String,
        code: NormalizedCode,
    },

    #[error("mapping {code}: no keys given")]
    EmptyKeys { code: NormalizedCode },

    #[error("mapping {code}: {action_type:?} action takes exactly one key, got {count}")]
    WrongKeyCount {
        code: NormalizedCode,
        action_type: ActionType,
        count: usize,
    },

    #[error("mapping {code}: unknown key {key:?}")]
    UnknownKey { code: NormalizedCode, key: String },

    #[error("mapping {code}: key {key} appears twice in the combo")]
    DuplicateKey { code: NormalizedCode, key: HidKeyCode },

    #[error("mapping {code}: unknown special command {token:?}")]
    UnknownSpecial { code: NormalizedCode, token: String },

    #[error("mapping {code}: delay of {millis} ms exceeds {} ms", MAX_ACTION_DELAY.as_millis())]
    DelayTooLong { code: NormalizedCode, millis: u64 },
}

/// The action bound to one code, with its human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    pub action: ActionSpec,
    pub description: String,
}

impl KeyMapping {
    pub fn new(action: ActionSpec, description: impl Into<String>) -> Self {
        Self {
            action,
            description: description.into(),
        }
    }
}

/// A validated remote profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileDocument", into = "ProfileDocument")]
pub struct Profile {
    pub name: String,
    pub brand: String,
    pub model: Option<String>,
    pub description: Option<String>,
    mappings: BTreeMap<NormalizedCode, KeyMapping>,
}

impl Profile {
    /// Creates an empty profile.
    pub fn new(name: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            brand: brand.into(),
            model: None,
            description: None,
            mappings: BTreeMap::new(),
        }
    }

    /// The built-in profile for a stock Vizio TV remote.
    pub fn default_vizio() -> Self {
        defaults::vizio_remote()
    }

    /// Binds `code` to `mapping`, returning the previous binding.
    pub fn insert(&mut self, code: NormalizedCode, mapping: KeyMapping) -> Option<KeyMapping> {
        self.mappings.insert(code, mapping)
    }

    pub fn remove(&mut self, code: &NormalizedCode) -> Option<KeyMapping> {
        self.mappings.remove(code)
    }

    /// Exact-match lookup on the normalized code.
    pub fn mapping_for(&self, code: &NormalizedCode) -> Option<&KeyMapping> {
        self.mappings.get(code)
    }

    pub fn action_for(&self, code: &NormalizedCode) -> Option<&ActionSpec> {
        self.mapping_for(code).map(|m| &m.action)
    }

    /// All bindings ordered by code.
    pub fn mappings(&self) -> impl Iterator<Item = (&NormalizedCode, &KeyMapping)> {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// File name the profile is stored under: `<brand>_<model>.json`, with
    /// spaces replaced by `_`. The profile name stands in for a missing model.
    pub fn file_name(&self) -> String {
        let model = self.model.as_deref().unwrap_or(&self.name);
        format!("{}_{}.json", self.brand.trim(), model.trim()).replace(' ', "_")
    }

    /// Parses and validates a profile from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Pretty-printed JSON in canonical form.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
