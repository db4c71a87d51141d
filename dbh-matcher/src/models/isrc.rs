//! International Standard Recording Code

use crate::error::MatcherError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Validated ISRC in canonical form (upper-case, no separators)
///
/// Layout: `CC` country (alphabetic), `XXX` registrant (alphanumeric),
/// `YY` year and `NNNNN` designation (digits).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isrc(String);

impl Isrc {
    pub const LEN: usize = 12;

    /// Parse and normalize an ISRC
    ///
    /// Hyphens and whitespace are stripped and letters upper-cased, so
    /// `us-um7-19-21131` parses as `USUM71921131`.
    pub fn parse(raw: &str) -> Result<Self, MatcherError> {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        let bytes = normalized.as_bytes();
        let valid = bytes.len() == Self::LEN
            && bytes[..2].iter().all(u8::is_ascii_alphabetic)
            && bytes[2..5].iter().all(u8::is_ascii_alphanumeric)
            && bytes[5..].iter().all(u8::is_ascii_digit);

        if valid {
            Ok(Self(normalized))
        } else {
            Err(MatcherError::InvalidIsrc(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isrc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isrc {
    type Err = MatcherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Isrc {
    type Error = MatcherError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Isrc> for String {
    fn from(isrc: Isrc) -> Self {
        isrc.0
    }
}
