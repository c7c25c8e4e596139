//! Roster types.

use crate::{Side, SteamId};
use serde::{Deserialize, Serialize};

/// One player in a match roster. Unique by `steam_id` within a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub steam_id: SteamId,
    pub name: Option<String>,
    pub side: Option<Side>,
}

impl Participant {
    /// Name for display, falling back to "Unknown".
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }
}
