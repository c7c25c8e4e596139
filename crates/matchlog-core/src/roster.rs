//! Roster extraction.
//!
//! Players come from the lookup service when a match id is known and the
//! service has the match; otherwise from the snapshot itself: the local
//! player first, then any player lists the client happened to include.

use crate::lookup::{LookupPlayer, MatchLookup};
use crate::normalizer::{self, side};
use matchlog_types::{Participant, SessionId, Side, Snapshot, SteamId};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot sections that may carry additional players.
const PLAYER_SECTIONS: [&str; 3] = ["players", "allplayers", "teams"];

/// Builds rosters, consulting the lookup service first.
#[derive(Clone)]
pub struct RosterExtractor {
    lookup: Arc<dyn MatchLookup>,
}

impl RosterExtractor {
    pub fn new(lookup: Arc<dyn MatchLookup>) -> Self {
        Self { lookup }
    }

    /// Extract the roster for a snapshot. Never fails: lookup errors fall
    /// back to the snapshot contents.
    pub async fn extract(&self, snapshot: &Snapshot, session_id: Option<&SessionId>) -> Vec<Participant> {
        if let Some(session_id) = session_id {
            match self.lookup.match_players(session_id).await {
                Ok(players) => {
                    let roster = from_lookup(players);
                    if !roster.is_empty() {
                        info!(
                            target: "matchlog::roster",
                            "Got {} players for match {} from lookup",
                            roster.len(),
                            session_id
                        );
                        return roster;
                    }
                    debug!(target: "matchlog::roster", "Lookup has no players for match {}", session_id);
                }
                Err(e) => {
                    warn!(target: "matchlog::roster", "Lookup for match {} failed: {}", session_id, e);
                }
            }
        }

        local_roster(snapshot)
    }
}

/// Convert lookup results, widening account ids. Anonymous players (no
/// account id) are dropped.
pub fn from_lookup(players: Vec<LookupPlayer>) -> Vec<Participant> {
    let mut roster = Roster::default();
    for player in players {
        let Some(account_id) = player.account_id else {
            continue;
        };
        roster.push(Participant {
            steam_id: SteamId::from_account_id(account_id),
            name: player.personaname,
            side: player
                .is_radiant
                .map(|radiant| if radiant { Side::Radiant } else { Side::Dire }),
        });
    }
    roster.into_inner()
}

/// Roster from the snapshot alone.
pub fn local_roster(snapshot: &Snapshot) -> Vec<Participant> {
    let mut roster = Roster::default();

    if let Some(actor) = &snapshot.actor {
        if let Some(steam_id) = actor.steam_id {
            roster.push(Participant {
                steam_id,
                name: actor.name.clone(),
                side: actor.side,
            });
        }
    }

    for key in PLAYER_SECTIONS {
        match snapshot.raw.get(key) {
            Some(Value::Object(entries)) => {
                for candidate in entries.values() {
                    roster.push_candidate(candidate);
                }
            }
            Some(Value::Array(entries)) => {
                for candidate in entries {
                    roster.push_candidate(candidate);
                }
            }
            _ => {}
        }
    }

    roster.into_inner()
}

/// Ordered roster with first-seen-wins de-duplication.
#[derive(Default)]
struct Roster {
    players: Vec<Participant>,
    seen: HashSet<SteamId>,
}

impl Roster {
    fn push(&mut self, participant: Participant) {
        if self.seen.insert(participant.steam_id) {
            self.players.push(participant);
        }
    }

    fn push_candidate(&mut self, candidate: &Value) {
        let Some(candidate) = candidate.as_object() else {
            return;
        };
        let Some(steam_id) = candidate_id(candidate) else {
            return;
        };
        self.push(Participant {
            steam_id,
            name: normalizer::string(candidate, "name"),
            side: side(candidate, "team").or_else(|| side(candidate, "team_name")),
        });
    }

    fn into_inner(self) -> Vec<Participant> {
        self.players
    }
}

/// `steamid`, or else the narrow `account_id` taken as-is.
fn candidate_id(candidate: &Map<String, Value>) -> Option<SteamId> {
    let field = |key: &str| {
        candidate
            .get(key)
            .and_then(normalizer::steam_id)
            .filter(|id| id.0 != 0)
    };
    field("steamid").or_else(|| field("account_id"))
}
