//! matchlog server library - HTTP receiver for Dota 2 Game State Integration.
//!
//! Routes, configuration and application state live here so integration
//! tests can build the same router as the binary.

pub mod config;
pub mod logging;
pub mod routes;
pub mod state;

use axum::{routing::get, Router};
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::status).post(routes::ingest::receive))
        .route("/health", get(routes::health))
        .route("/players", get(routes::players::list))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
