//! Current match roster.

use crate::state::AppState;
use axum::{extract::State, Json};
use matchlog_core::{load, profile_links_for};
use matchlog_types::{Participant, Side};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayersResponse {
    Ok {
        players: Vec<PlayerEntry>,
        count: usize,
    },
    NoMatch {
        message: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Serialize)]
pub struct PlayerEntry {
    pub steamid: String,
    pub name: String,
    pub team: Option<Side>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dotabuff_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opendota_url: Option<String>,
}

impl From<&Participant> for PlayerEntry {
    fn from(player: &Participant) -> Self {
        let links = profile_links_for(player.steam_id);
        Self {
            steamid: player.steam_id.to_string(),
            name: player.display_name().to_string(),
            team: player.side,
            dotabuff_url: links.as_ref().map(|l| l.dotabuff.clone()),
            opendota_url: links.map(|l| l.opendota),
        }
    }
}

/// GET /players - Roster of the match currently being recorded.
///
/// Reads whatever is on disk right now; it does not wait for an ingest in
/// progress.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<PlayersResponse> {
    let lifecycle = state.lifecycle();
    let active = lifecycle.active;
    let Some(handle) = lifecycle.handle.filter(|h| active && h.path().is_file()) else {
        return Json(PlayersResponse::NoMatch {
            message: "No active match".to_string(),
        });
    };

    let record = match load(handle.path()) {
        Ok(record) => record,
        Err(e) => {
            error!(target: "matchlog::api", "Failed to read match file for players: {}", e);
            return Json(PlayersResponse::Error {
                message: e.to_string(),
            });
        }
    };

    let roster = state
        .roster
        .extract(&record.last_snapshot, record.session_id.as_ref())
        .await;
    let players: Vec<PlayerEntry> = roster.iter().map(PlayerEntry::from).collect();

    Json(PlayersResponse::Ok {
        count: players.len(),
        players,
    })
}
