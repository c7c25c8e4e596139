//! Persisted per-match record.

use crate::{SessionId, Snapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One snapshot appended to an open record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotUpdate {
    pub timestamp: DateTime<Utc>,
    pub snapshot: Snapshot,
}

/// The on-disk history of a single match.
///
/// `updates` only ever grows and is ordered by receipt time. A record is
/// open until `record_ended_at` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub record_started_at: DateTime<Utc>,
    pub session_id: Option<SessionId>,
    pub initial_snapshot: Snapshot,
    #[serde(default)]
    pub updates: Vec<SnapshotUpdate>,
    pub last_update_at: DateTime<Utc>,
    pub last_snapshot: Snapshot,
    #[serde(default)]
    pub record_ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub final_snapshot: Option<Snapshot>,
}

impl MatchRecord {
    /// Start a record whose only content is its initial snapshot.
    pub fn new(session_id: Option<SessionId>, initial: Snapshot, now: DateTime<Utc>) -> Self {
        Self {
            record_started_at: now,
            session_id,
            last_snapshot: initial.clone(),
            initial_snapshot: initial,
            updates: Vec::new(),
            last_update_at: now,
            record_ended_at: None,
            final_snapshot: None,
        }
    }

    pub fn push_update(&mut self, snapshot: Snapshot, now: DateTime<Utc>) {
        self.last_snapshot = snapshot.clone();
        self.last_update_at = now;
        self.updates.push(SnapshotUpdate {
            timestamp: now,
            snapshot,
        });
    }

    pub fn close(&mut self, final_snapshot: Snapshot, now: DateTime<Utc>) {
        self.record_ended_at = Some(now);
        self.final_snapshot = Some(final_snapshot);
    }

    pub fn is_open(&self) -> bool {
        self.record_ended_at.is_none()
    }
}
