//! Integration tests for the snapshot ingest pipeline.
//!
//! These drive the full router: snapshots posted to `/` flow through the
//! normalizer and the lifecycle coordinator into match files, and the read
//! endpoints reflect the resulting state.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use matchlog_core::{load, LookupError, LookupPlayer, MatchLookup, MatchStore};
use matchlog_server::{app, config::Config, state::AppState};
use matchlog_types::SessionId;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

// ============================================================================
// HELPERS
// ============================================================================

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("gsi")
        .join(format!("{}.json", name))
}

fn load_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Lookup that answers with a fixed roster for one match id.
struct FixedLookup {
    match_id: &'static str,
    players: Vec<LookupPlayer>,
}

#[async_trait]
impl MatchLookup for FixedLookup {
    async fn match_players(&self, session_id: &SessionId) -> Result<Vec<LookupPlayer>, LookupError> {
        if session_id.as_str() == self.match_id {
            Ok(self.players.clone())
        } else {
            Err(LookupError::Status {
                status: 404,
                body: "match not found".to_string(),
            })
        }
    }
}

fn test_config(output_dir: &Path) -> Config {
    let mut config = Config::default();
    config.port = 0;
    config.output_dir = output_dir.to_path_buf();
    config.lookup.enabled = false;
    config
}

fn create_test_app_with(lookup: Arc<dyn MatchLookup>) -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = Arc::new(AppState::with_lookup(test_config(temp_dir.path()), lookup));
    (app(state), temp_dir)
}

fn create_test_app() -> (Router, TempDir) {
    create_test_app_with(Arc::new(FixedLookup {
        match_id: "never",
        players: Vec::new(),
    }))
}

async fn post(app: &Router, body: impl Into<Body>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("Response was not JSON ({}): {:?}", e, bytes));
    (status, body)
}

fn match_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for day in std::fs::read_dir(root).unwrap() {
        let day = day.unwrap().path();
        if !day.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(&day).unwrap() {
            files.push(file.unwrap().path());
        }
    }
    files.sort();
    files
}

// ============================================================================
// INGEST RESPONSES
// ============================================================================

#[tokio::test]
async fn test_empty_body_is_acknowledged() {
    let (app, temp_dir) = create_test_app();

    for body in ["", "   \n", "null", "{}"] {
        let (status, response) = post(&app, body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["status"], "ok");
        assert_eq!(response["message"], "Empty data received");
        assert!(response.get("processed").is_none());
    }

    assert!(match_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_malformed_json_still_returns_200() {
    let (app, temp_dir) = create_test_app();

    let (status, response) = post(&app, "{\"map\": ").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "error");
    assert!(response["message"]
        .as_str()
        .unwrap()
        .starts_with("Malformed JSON"));

    assert!(match_files(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_idle_snapshot_is_processed_without_recording() {
    let (app, temp_dir) = create_test_app();

    let (status, response) = post(&app, load_fixture("hero_selection")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "ok");
    assert_eq!(response["processed"], true);

    assert!(match_files(temp_dir.path()).is_empty());
    let (_, status) = get(&app, "/").await;
    assert_eq!(status["match_in_progress"], false);
}

#[tokio::test]
async fn test_store_failure_reports_error_with_200() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("not-a-dir");
    std::fs::write(&blocker, "occupied").unwrap();

    let state = Arc::new(AppState::with_lookup(
        test_config(&blocker),
        Arc::new(matchlog_core::DisabledLookup),
    ));
    let app = app(state);

    let (status, response) = post(&app, load_fixture("in_progress")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "error");
    assert!(response["message"].is_string());
}

// ============================================================================
// MATCH LIFECYCLE
// ============================================================================

#[tokio::test]
async fn test_identified_match_start_to_finish() {
    let (app, temp_dir) = create_test_app();

    let (_, response) = post(&app, load_fixture("in_progress")).await;
    assert_eq!(response["processed"], true);

    let (_, status) = get(&app, "/").await;
    assert_eq!(status["status"], "running");
    assert_eq!(status["service"], "matchlog");
    assert_eq!(status["match_in_progress"], true);
    assert_eq!(status["current_match_id"], "111");

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["match_in_progress"], true);

    let files = match_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("match_111_"), "unexpected file name {}", name);
    assert!(name.ends_with(".json"));

    let (_, response) = post(&app, load_fixture("in_progress")).await;
    assert_eq!(response["processed"], true);

    let (_, response) = post(&app, load_fixture("post_game")).await;
    assert_eq!(response["processed"], true);

    let (_, status) = get(&app, "/").await;
    assert_eq!(status["match_in_progress"], false);
    assert!(status["current_match_id"].is_null());

    let (_, players) = get(&app, "/players").await;
    assert_eq!(players["status"], "no_match");
    assert_eq!(players["message"], "No active match");

    let files = match_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let record = load(&files[0]).unwrap();
    assert_eq!(record.session_id.as_ref().map(|id| id.as_str()), Some("111"));
    assert_eq!(record.updates.len(), 2);
    assert!(record.record_ended_at.is_some());
    let final_snapshot = record.final_snapshot.expect("final snapshot");
    assert_eq!(
        final_snapshot.session.and_then(|s| s.game_clock),
        Some(2640)
    );
}

#[tokio::test]
async fn test_start_then_winner_finalizes_same_record() {
    let (app, temp_dir) = create_test_app();

    post(&app, load_fixture("in_progress")).await;
    post(&app, load_fixture("post_game")).await;

    let files = match_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let record = load(&files[0]).unwrap();
    assert_eq!(record.updates.len(), 1);
    assert!(!record.is_open());

    let (_, players) = get(&app, "/players").await;
    assert_eq!(players["status"], "no_match");
}

#[tokio::test]
async fn test_unidentified_snapshots_share_one_file() {
    let (app, temp_dir) = create_test_app();

    post(&app, load_fixture("no_match_id")).await;
    post(&app, load_fixture("no_match_id")).await;

    let files = match_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
    let stamp = name.trim_start_matches("match_");
    assert!(
        stamp.starts_with(|c: char| c.is_ascii_digit()),
        "unexpected file name {}",
        name
    );

    let record = load(&files[0]).unwrap();
    assert!(record.session_id.is_none());
    assert_eq!(record.updates.len(), 1);
    assert!(record.is_open());

    let (_, status) = get(&app, "/").await;
    assert_eq!(status["match_in_progress"], true);
    assert!(status["current_match_id"].is_null());
}

#[tokio::test]
async fn test_new_match_id_rolls_over() {
    let (app, temp_dir) = create_test_app();

    post(&app, load_fixture("in_progress")).await;

    let mut next: Value = serde_json::from_str(&load_fixture("in_progress")).unwrap();
    next["map"]["matchid"] = json!("222");
    post(&app, next.to_string()).await;

    let (_, status) = get(&app, "/").await;
    assert_eq!(status["current_match_id"], "222");

    let files = match_files(temp_dir.path());
    assert_eq!(files.len(), 2);
    let records: Vec<_> = files.iter().map(|f| load(f).unwrap()).collect();
    let first = records
        .iter()
        .find(|r| r.session_id.as_ref().map(|id| id.as_str()) == Some("111"))
        .unwrap();
    let second = records
        .iter()
        .find(|r| r.session_id.as_ref().map(|id| id.as_str()) == Some("222"))
        .unwrap();
    assert!(!first.is_open());
    assert!(second.is_open());
}

#[tokio::test]
async fn test_restart_resumes_existing_file() {
    let temp_dir = TempDir::new().unwrap();

    for _ in 0..2 {
        let state = Arc::new(AppState::with_lookup(
            test_config(temp_dir.path()),
            Arc::new(matchlog_core::DisabledLookup),
        ));
        let app = app(state);
        post(&app, load_fixture("in_progress")).await;
    }

    let files = match_files(temp_dir.path());
    assert_eq!(files.len(), 1);
    let record = load(&files[0]).unwrap();
    assert_eq!(record.updates.len(), 0);
    assert!(record.is_open());

    let latest = MatchStore::new(temp_dir.path()).latest_record_path().unwrap();
    assert_eq!(latest.as_deref(), Some(files[0].as_path()));
}

// ============================================================================
// PLAYERS
// ============================================================================

#[tokio::test]
async fn test_players_without_match() {
    let (app, _temp_dir) = create_test_app();

    let (status, players) = get(&app, "/players").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(players["status"], "no_match");
}

#[tokio::test]
async fn test_players_from_snapshot_when_lookup_misses() {
    let (app, _temp_dir) = create_test_app();
    post(&app, load_fixture("in_progress")).await;

    let (_, players) = get(&app, "/players").await;
    assert_eq!(players["status"], "ok");
    assert_eq!(players["count"], 2);

    let list = players["players"].as_array().unwrap();
    assert_eq!(list[0]["steamid"], "76561198218419015");
    assert_eq!(list[0]["name"], "kez");
    assert_eq!(list[0]["team"], "radiant");
    assert_eq!(
        list[0]["dotabuff_url"],
        "https://www.dotabuff.com/players/76561198218419015"
    );
    assert_eq!(
        list[0]["opendota_url"],
        "https://www.opendota.com/players/76561198218419015"
    );

    assert_eq!(list[1]["steamid"], "90001");
    assert_eq!(list[1]["name"], "opponent");
    assert_eq!(list[1]["team"], "dire");
    assert!(list[1].get("dotabuff_url").is_none());
}

#[tokio::test]
async fn test_players_from_lookup() {
    let (app, _temp_dir) = create_test_app_with(Arc::new(FixedLookup {
        match_id: "111",
        players: vec![
            LookupPlayer {
                account_id: Some(258153287),
                personaname: Some("kez".to_string()),
                is_radiant: Some(true),
            },
            LookupPlayer {
                account_id: None,
                personaname: None,
                is_radiant: Some(false),
            },
            LookupPlayer {
                account_id: Some(1),
                personaname: None,
                is_radiant: Some(false),
            },
        ],
    }));
    post(&app, load_fixture("in_progress")).await;

    let (_, players) = get(&app, "/players").await;
    assert_eq!(players["status"], "ok");
    assert_eq!(players["count"], 2);

    let list = players["players"].as_array().unwrap();
    assert_eq!(list[0]["steamid"], "76561198218419015");
    assert_eq!(list[0]["team"], "radiant");
    assert_eq!(list[1]["steamid"], "76561197960265729");
    assert_eq!(list[1]["name"], "Unknown");
    assert_eq!(list[1]["team"], "dire");
}
