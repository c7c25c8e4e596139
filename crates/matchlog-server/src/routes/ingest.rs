//! GSI snapshot receiver.
//!
//! The game client posts its full state here every few seconds. The
//! response is always 200: a non-success status makes the client resend,
//! which would only replay the same failure.

use crate::state::AppState;
use axum::{body::Bytes, extract::State, Json};
use matchlog_core::normalize;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Response for ingested snapshots.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IngestResponse {
    fn processed() -> Self {
        Self {
            status: "ok",
            processed: Some(true),
            message: None,
        }
    }

    fn empty() -> Self {
        Self {
            status: "ok",
            processed: None,
            message: Some("Empty data received".to_string()),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            processed: None,
            message: Some(message.into()),
        }
    }
}

/// POST / - Receive one GSI snapshot.
pub async fn receive(State(state): State<Arc<AppState>>, body: Bytes) -> Json<IngestResponse> {
    if body.iter().all(u8::is_ascii_whitespace) {
        warn!(target: "matchlog::ingest", "Received empty request");
        return Json(IngestResponse::empty());
    }

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(target: "matchlog::ingest", "Malformed snapshot body: {}", e);
            return Json(IngestResponse::error(format!("Malformed JSON: {}", e)));
        }
    };

    let is_empty = match &raw {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if is_empty {
        warn!(target: "matchlog::ingest", "Received empty snapshot");
        return Json(IngestResponse::empty());
    }

    let snapshot = normalize(&raw);
    debug!(
        target: "matchlog::ingest",
        "Received snapshot: {}",
        snapshot
            .game_state()
            .map(|s| s.as_str())
            .unwrap_or("Unknown")
    );

    let result = state.coordinator.lock().await.handle(&snapshot);
    match result {
        Ok(transition) => {
            debug!(target: "matchlog::ingest", "Transition: {:?}", transition);
            Json(IngestResponse::processed())
        }
        Err(e) => {
            error!(target: "matchlog::ingest", "Failed to process snapshot: {}", e);
            Json(IngestResponse::error(e.to_string()))
        }
    }
}
