//! Match lifecycle state machine.
//!
//! The client never announces a match start or end, so the coordinator
//! infers it per snapshot. A match id, when present, decides which record a
//! snapshot belongs to. Without one, the game-state predicates decide
//! whether a record should be opened. Either way a snapshot that looks
//! finished closes the open record after it has been written.

use crate::normalizer::{is_ended, is_started};
use crate::roster::local_roster;
use crate::store::{Appended, MatchStore, Opened, RecordHandle};
use crate::Result;
use matchlog_types::{SessionId, Snapshot};
use tokio::sync::watch;
use tracing::{debug, info};

/// The one piece of mutable lifecycle state. Only [`Coordinator`] writes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub active: bool,
    pub session_id: Option<SessionId>,
    pub handle: Option<RecordHandle>,
}

/// What the coordinator did with the record for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// A record was opened for a new match.
    Started(Opened),
    /// The previous match was closed and a record opened for a new id.
    RolledOver(Opened),
    /// The snapshot was added to the open record.
    Appended(Appended),
    /// The snapshot did not belong to any match.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    /// The open record was closed after `action`.
    pub finalized: bool,
}

/// Drives a [`MatchStore`] from a stream of snapshots.
///
/// Snapshots must be fed one at a time in receipt order; wrap the
/// coordinator in a mutex when sharing it.
pub struct Coordinator {
    store: MatchStore,
    state: LifecycleState,
    publisher: watch::Sender<LifecycleState>,
}

impl Coordinator {
    pub fn new(store: MatchStore) -> Self {
        let (publisher, _) = watch::channel(LifecycleState::default());
        Self {
            store,
            state: LifecycleState::default(),
            publisher,
        }
    }

    /// Receive the lifecycle state after every handled snapshot.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.publisher.subscribe()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn store(&self) -> &MatchStore {
        &self.store
    }

    /// Apply one snapshot.
    ///
    /// On a store error the state is left where the failure happened and
    /// the error is returned; the next snapshot retries from there.
    pub fn handle(&mut self, snapshot: &Snapshot) -> Result<Transition> {
        let result = self.apply(snapshot);
        self.publisher.send_replace(self.state.clone());
        result
    }

    fn apply(&mut self, snapshot: &Snapshot) -> Result<Transition> {
        let started = is_started(snapshot);
        let ended = is_ended(snapshot);

        let action = match snapshot.session_id() {
            Some(id) if self.state.session_id.as_ref() != Some(id) => {
                let rolled_over = self.state.active && self.state.handle.is_some();
                if rolled_over {
                    self.close_open_record(snapshot)?;
                }
                self.state.handle = None;

                let (handle, opened) = self.store.start_or_resume(Some(id), snapshot, None)?;
                self.state = LifecycleState {
                    active: true,
                    session_id: Some(id.clone()),
                    handle: Some(handle),
                };
                info!(target: "matchlog::lifecycle", "Match started (id: {})", id);
                log_roster(snapshot);

                if rolled_over {
                    Action::RolledOver(opened)
                } else {
                    Action::Started(opened)
                }
            }
            Some(id) => match &self.state.handle {
                Some(handle) => Action::Appended(self.store.append(handle, snapshot)?),
                None => {
                    let (handle, opened) = self.store.start_or_resume(Some(id), snapshot, None)?;
                    self.state.active = true;
                    self.state.handle = Some(handle);
                    Action::Started(opened)
                }
            },
            None if started && !ended => match self.open_handle() {
                Some(handle) => Action::Appended(self.store.append(&handle, snapshot)?),
                None => {
                    let tracked = self.state.handle.clone();
                    let (handle, opened) = self.store.start_or_resume(None, snapshot, tracked)?;
                    self.state.active = true;
                    self.state.handle = Some(handle);
                    info!(target: "matchlog::lifecycle", "Match started (no id)");
                    log_roster(snapshot);
                    Action::Started(opened)
                }
            },
            None => Action::Ignored,
        };

        let finalized = ended && self.state.active;
        if finalized {
            self.close_open_record(snapshot)?;
            self.state = LifecycleState::default();
            info!(target: "matchlog::lifecycle", "Match ended");
        }

        debug!(target: "matchlog::lifecycle", "Snapshot handled: {:?} (finalized: {})", action, finalized);
        Ok(Transition { action, finalized })
    }

    fn open_handle(&self) -> Option<RecordHandle> {
        if self.state.active {
            self.state.handle.clone()
        } else {
            None
        }
    }

    fn close_open_record(&mut self, final_snapshot: &Snapshot) -> Result<()> {
        if let Some(handle) = self.state.handle.clone() {
            self.store.finalize(handle, final_snapshot)?;
            self.state.handle = None;
        }
        Ok(())
    }
}

fn log_roster(snapshot: &Snapshot) {
    let players = local_roster(snapshot);
    if players.is_empty() {
        return;
    }
    info!(target: "matchlog::roster", "Players in match ({}):", players.len());
    for player in &players {
        let side = player.side.map(|s| s.as_str()).unwrap_or("unknown");
        info!(
            target: "matchlog::roster",
            "  - {} (SteamID: {}, Team: {})",
            player.display_name(),
            player.steam_id,
            side
        );
    }
}
