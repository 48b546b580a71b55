//! crates/ap_core/src/ids.rs
//! Registry tokens for parties and districts.
//!
//! Labels come straight from election tables ("Sogn og Fjordane", "KRF",
//! "Troms Romsa"), so the token rule is permissive: non-empty, at most 128
//! bytes, no control characters, no leading/trailing whitespace.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::CoreError;

const TOKEN_MAX_LEN: usize = 128;

/// Token shape shared by `PartyId` and `DistrictId`.
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= TOKEN_MAX_LEN
        && s.trim() == s
        && !s.chars().any(char::is_control)
}

macro_rules! def_token {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_valid_token(s) { Ok(Self(s.to_owned())) } else { Err(CoreError::InvalidToken(s.to_owned())) }
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    }
}

def_token!(
    /// Party (or candidate) label, unique within a vote table.
    PartyId
);
def_token!(
    /// Electoral district (county, state) label, unique within the reference table.
    DistrictId
);
