//! Shared application state.

use crate::config::Config;
use matchlog_core::{
    Coordinator, DisabledLookup, LifecycleState, LookupError, MatchLookup, MatchStore,
    OpenDotaClient, RosterExtractor,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Shared application state.
pub struct AppState {
    /// Serializes snapshot handling; held for the whole of one ingest.
    pub coordinator: Mutex<Coordinator>,
    /// Latest lifecycle state, readable without the ingest lock.
    pub lifecycle: watch::Receiver<LifecycleState>,
    pub roster: RosterExtractor,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, LookupError> {
        let lookup: Arc<dyn MatchLookup> = if config.lookup.enabled {
            Arc::new(OpenDotaClient::new(
                config.lookup.base_url.clone(),
                config.lookup.timeout(),
            )?)
        } else {
            Arc::new(DisabledLookup)
        };

        Ok(Self::with_lookup(config, lookup))
    }

    /// Build state around a caller-supplied lookup service.
    pub fn with_lookup(config: Config, lookup: Arc<dyn MatchLookup>) -> Self {
        let coordinator = Coordinator::new(MatchStore::new(config.output_dir.clone()));
        let lifecycle = coordinator.subscribe();

        Self {
            coordinator: Mutex::new(coordinator),
            lifecycle,
            roster: RosterExtractor::new(lookup),
            config,
        }
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle.borrow().clone()
    }
}
