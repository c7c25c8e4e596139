//! HTTP route handlers.

pub mod ingest;
pub mod players;

use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub match_in_progress: bool,
    pub current_match_id: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub match_in_progress: bool,
    pub version: &'static str,
}

/// GET / - Service status and the match being recorded.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let lifecycle = state.lifecycle();
    Json(StatusResponse {
        status: "running",
        service: "matchlog",
        match_in_progress: lifecycle.active,
        current_match_id: lifecycle.session_id.map(|id| id.to_string()),
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        match_in_progress: state.lifecycle().active,
        version: env!("CARGO_PKG_VERSION"),
    })
}
