//! Snapshot normalization, match lifecycle and persistence for matchlog.

mod error;
mod lifecycle;
mod links;
mod lookup;
mod normalizer;
mod roster;
mod store;

pub use error::{LookupError, MatchlogError};
pub use lifecycle::{Action, Coordinator, LifecycleState, Transition};
pub use links::{profile_links, profile_links_for, ProfileLinks};
pub use lookup::{
    parse_match_players, DisabledLookup, LookupPlayer, MatchLookup, OpenDotaClient,
    OPENDOTA_API_BASE,
};
pub use normalizer::{is_ended, is_started, normalize, INVENTORY_SLOTS};
pub use roster::{from_lookup, local_roster, RosterExtractor};
pub use store::{load, Appended, MatchStore, Opened, RecordHandle};

/// Result type for matchlog operations.
pub type Result<T> = std::result::Result<T, MatchlogError>;
