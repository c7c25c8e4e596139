//! Match lookup service client (OpenDota).
//!
//! Used for enrichment only: the local snapshot is always the fallback, so
//! every failure here is recoverable by the caller.

use crate::LookupError;
use async_trait::async_trait;
use matchlog_types::SessionId;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const OPENDOTA_API_BASE: &str = "https://api.opendota.com/api";

/// One player as reported by the lookup service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LookupPlayer {
    /// Narrow account id; `None` for anonymous players.
    #[serde(default)]
    pub account_id: Option<u32>,
    #[serde(default)]
    pub personaname: Option<String>,
    #[serde(default, rename = "isRadiant")]
    pub is_radiant: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct MatchResponse {
    players: Vec<LookupPlayer>,
}

/// Source of full-match rosters keyed by match id.
#[async_trait]
pub trait MatchLookup: Send + Sync {
    async fn match_players(&self, session_id: &SessionId) -> Result<Vec<LookupPlayer>, LookupError>;
}

/// Lookup that never has data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLookup;

#[async_trait]
impl MatchLookup for DisabledLookup {
    async fn match_players(&self, _session_id: &SessionId) -> Result<Vec<LookupPlayer>, LookupError> {
        Ok(Vec::new())
    }
}

#[derive(Clone)]
pub struct OpenDotaClient {
    client: Client,
    base_url: String,
}

impl OpenDotaClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("matchlog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MatchLookup for OpenDotaClient {
    async fn match_players(&self, session_id: &SessionId) -> Result<Vec<LookupPlayer>, LookupError> {
        let url = self.url(&format!("/matches/{}", session_id));
        debug!(target: "matchlog::lookup", "GET {}", url);

        let resp = self.client.get(&url).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LookupError::Status { status, body });
        }

        let body = resp.text().await?;
        parse_match_players(&body)
    }
}

/// Decode a `/matches/{id}` response body.
pub fn parse_match_players(body: &str) -> Result<Vec<LookupPlayer>, LookupError> {
    serde_json::from_str::<MatchResponse>(body)
        .map(|resp| resp.players)
        .map_err(|e| LookupError::Decode(e.to_string()))
}
