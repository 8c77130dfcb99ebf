//! Normalized IR codes.
//!
//! Every IR code the host handles is held in one canonical textual form:
//! uppercase hexadecimal, no `0x` prefix, no leading zeros. The receiver sends
//! `0x08`; the host stores `"8"`. Profile files may spell the same code as
//! `"0x8"`, `"0X08"` or `"8"` and all of them resolve to the same key.
//!
//! Codes that are not hexadecimal (`"ZZ"`) are still valid identifiers: they
//! are uppercased and kept verbatim so a profile can carry them, they simply
//! never arrive over the serial link.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while normalizing a code string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("IR code is empty")]
    Empty,

    #[error("IR code {code:?} contains invalid character {ch:?}")]
    InvalidCharacter { code: String, ch: char },
}

/// A validated IR code in canonical host form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedCode(String);

impl NormalizedCode {
    /// Normalizes a code as written in a profile or typed by a user.
    ///
    /// Accepts an optional `0x`/`0X` prefix and surrounding whitespace.
    /// Only ASCII alphanumerics are allowed in the body.
    ///
    /// # Errors
    ///
    /// [`CodeError::Empty`] when nothing remains after the prefix, or
    /// [`CodeError::InvalidCharacter`] for anything outside `[0-9A-Za-z]`.
    pub fn new(raw: &str) -> Result<Self, CodeError> {
        let trimmed = raw.trim();
        let body = strip_hex_prefix(trimmed).unwrap_or(trimmed);
        if body.is_empty() {
            return Err(CodeError::Empty);
        }
        if let Some(ch) = body.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacter {
                code: raw.to_string(),
                ch,
            });
        }

        let upper = body.to_ascii_uppercase();
        if upper.chars().all(|c| c.is_ascii_hexdigit()) {
            let stripped = upper.trim_start_matches('0');
            if stripped.is_empty() {
                return Ok(Self("0".to_string()));
            }
            return Ok(Self(stripped.to_string()));
        }
        Ok(Self(upper))
    }

    /// Builds the canonical form of a numeric code.
    pub fn from_value(value: u32) -> Self {
        Self(format!("{value:X}"))
    }

    /// The canonical string, e.g. `"8"` or `"FF"`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric value when the code is hexadecimal and fits in 32 bits.
    pub fn value(&self) -> Option<u32> {
        u32::from_str_radix(&self.0, 16).ok()
    }
}

/// Returns the text after a `0x`/`0X` prefix, if present.
pub(crate) fn strip_hex_prefix(s: &str) -> Option<&str> {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
}

impl fmt::Display for NormalizedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NormalizedCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for NormalizedCode {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<NormalizedCode> for String {
    fn from(code: NormalizedCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_strips_prefix_and_leading_zeros() {
        assert_eq!(NormalizedCode::new("0x08").unwrap().as_str(), "8");
        assert_eq!(NormalizedCode::new("0X2f").unwrap().as_str(), "2F");
        assert_eq!(NormalizedCode::new("00FF").unwrap().as_str(), "FF");
        assert_eq!(NormalizedCode::new(" 0xEA ").unwrap().as_str(), "EA");
    }

    #[test]
    fn test_new_keeps_zero_code() {
        assert_eq!(NormalizedCode::new("0x00").unwrap().as_str(), "0");
        assert_eq!(NormalizedCode::new("0").unwrap().as_str(), "0");
    }

    #[test]
    fn test_new_keeps_non_hex_codes_uppercase() {
        // Act
        let code = NormalizedCode::new("zz").unwrap();

        // Assert
        assert_eq!(code.as_str(), "ZZ");
        assert_eq!(code.value(), None);
    }

    #[test]
    fn test_new_rejects_empty_and_invalid_input() {
        assert_eq!(NormalizedCode::new(""), Err(CodeError::Empty));
        assert_eq!(NormalizedCode::new("0x"), Err(CodeError::Empty));
        assert!(matches!(
            NormalizedCode::new("0x1-2"),
            Err(CodeError::InvalidCharacter { ch: '-', .. })
        ));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for raw in ["0x08", "ff", "0X00A0", "ZZ", "12345678"] {
            // Arrange
            let once = NormalizedCode::new(raw).unwrap();

            // Act
            let twice = NormalizedCode::new(once.as_str()).unwrap();

            // Assert
            assert_eq!(once, twice, "normalizing {raw:?} twice changed it");
        }
    }

    #[test]
    fn test_from_value_matches_string_normalization() {
        assert_eq!(NormalizedCode::from_value(0x08), NormalizedCode::new("0x08").unwrap());
        assert_eq!(NormalizedCode::from_value(0), NormalizedCode::new("0x0").unwrap());
        assert_eq!(NormalizedCode::from_value(0xEA).value(), Some(0xEA));
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        // Act
        let json = serde_json::to_string(&NormalizedCode::new("0x2F").unwrap()).unwrap();
        let back: NormalizedCode = serde_json::from_str("\"0x002f\"").unwrap();

        // Assert
        assert_eq!(json, "\"2F\"");
        assert_eq!(back.as_str(), "2F");
    }
}
