//! Identifier types: match ids, Steam ids and team sides.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Offset between a 32-bit account id and its SteamID64 form.
pub const STEAM_ID64_OFFSET: u64 = 76_561_197_960_265_728;

/// Match identifier reported by the client in `map.matchid`.
///
/// Stored as the decimal string the client sends so ids beyond `i64`
/// survive round-trips through JSON tooling. Only ASCII digits are
/// accepted; the id ends up in file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Build a session id, returning `None` for blank or non-numeric input.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player identity in its wide (SteamID64) external form.
///
/// Candidates taken straight from a snapshot's `account_id` field are kept
/// verbatim, so a `SteamId` may occasionally hold a narrow value; only
/// [`SteamId::from_account_id`] applies the offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SteamId(pub u64);

impl SteamId {
    /// Convert a narrow 32-bit account id into SteamID64 form.
    pub fn from_account_id(account_id: u32) -> Self {
        Self(u64::from(account_id) + STEAM_ID64_OFFSET)
    }

    /// Recover the narrow account id, if this id is in wide form.
    pub fn account_id(&self) -> Option<u32> {
        self.0
            .checked_sub(STEAM_ID64_OFFSET)
            .and_then(|narrow| u32::try_from(narrow).ok())
    }

    /// Parse a decimal string, tolerating surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse().ok().map(Self)
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Team side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Radiant,
    Dire,
}

impl Side {
    /// Parse a side name. Anything other than radiant/dire (including the
    /// client's `"none"` placeholder) is not a side.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "radiant" => Some(Side::Radiant),
            "dire" => Some(Side::Dire),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Radiant => "radiant",
            Side::Dire => "dire",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
