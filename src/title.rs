use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Letters in the title prefix (`CUSA`).
pub const TITLE_PREFIX_LEN: usize = 4;
/// Digits after the prefix (`00411`).
pub const TITLE_NUMBER_LEN: usize = 5;
pub const TITLE_ID_LEN: usize = TITLE_PREFIX_LEN + TITLE_NUMBER_LEN;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TitleIdError {
    #[error("Title id must be {TITLE_ID_LEN} characters, got {0}")]
    BadLength(usize),
    #[error("Malformed title id '{0}': expected 4 uppercase letters then 5 digits")]
    Malformed(String),
}

/// A platform title identifier such as `CUSA00411`.
///
/// Only well-formed identifiers can be constructed; comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TitleId(String);

impl TitleId {
    pub fn parse(s: &str) -> Result<Self, TitleIdError> {
        if s.len() != TITLE_ID_LEN {
            return Err(TitleIdError::BadLength(s.len()));
        }
        if !s.is_ascii() {
            return Err(TitleIdError::Malformed(s.to_owned()));
        }
        let (prefix, number) = s.split_at(TITLE_PREFIX_LEN);
        let well_formed = prefix.bytes().all(|b| b.is_ascii_uppercase())
            && number.bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            return Err(TitleIdError::Malformed(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TitleId {
    type Err = TitleIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse(s) }
}

impl AsRef<str> for TitleId {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::borrow::Borrow<str> for TitleId {
    fn borrow(&self) -> &str { &self.0 }
}

impl Serialize for TitleId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TitleId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TitleId::parse(&raw).map_err(serde::de::Error::custom)
    }
}
