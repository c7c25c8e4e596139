//! JSON file persistence for match records.
//!
//! Layout: `<root>/<YYYY-MM-DD>/match_[<session_id>_]<YYYYmmdd_HHMMSS_mmm>.json`.
//! Each file holds one [`MatchRecord`] and is rewritten whole on every
//! change. Writes go through a sibling `.tmp` file and a rename, so a crash
//! mid-write leaves the previous version in place.
//!
//! Calls for the same record must be serialized by the caller; two
//! concurrent appends to one file would lose an update.

use crate::{MatchlogError, Result};
use chrono::{Local, Utc};
use matchlog_types::{MatchRecord, SessionId, Snapshot};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

const FILE_PREFIX: &str = "match_";
const FILE_EXTENSION: &str = "json";

/// Reference to the file backing an open record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHandle {
    path: PathBuf,
    session_id: Option<SessionId>,
}

impl RecordHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// How [`MatchStore::start_or_resume`] obtained its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opened {
    /// A new file was written with the initial snapshot.
    Created,
    /// An existing file for the same match id was found on disk.
    Resumed,
    /// The caller's tracked handle still had a file behind it.
    Reused,
}

/// Outcome of [`MatchStore::append`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appended {
    /// The snapshot was added; `updates` is the new update count.
    Appended { updates: usize },
    /// The file was missing or unreadable and was rewritten from scratch.
    Recreated,
}

/// File-backed store of match records.
#[derive(Debug, Clone)]
pub struct MatchStore {
    root: PathBuf,
}

impl MatchStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open the record a snapshot belongs to.
    ///
    /// Resolution order: an existing file for `session_id` (newest wins),
    /// then `tracked` if its file still exists, then a fresh file.
    pub fn start_or_resume(
        &self,
        session_id: Option<&SessionId>,
        initial: &Snapshot,
        tracked: Option<RecordHandle>,
    ) -> Result<(RecordHandle, Opened)> {
        if let Some(session_id) = session_id {
            if let Some(path) = self.find_existing(session_id)? {
                debug!(target: "matchlog::store", "Resuming match file {}", path.display());
                let handle = RecordHandle {
                    path,
                    session_id: Some(session_id.clone()),
                };
                return Ok((handle, Opened::Resumed));
            }
        }

        if let Some(handle) = tracked {
            if handle.exists() {
                debug!(target: "matchlog::store", "Reusing match file {}", handle.path.display());
                return Ok((handle, Opened::Reused));
            }
        }

        let handle = RecordHandle {
            path: self.new_record_path(session_id)?,
            session_id: session_id.cloned(),
        };
        let record = MatchRecord::new(handle.session_id.clone(), initial.clone(), Utc::now());
        write_record(&handle.path, &record)?;
        info!(target: "matchlog::store", "Started match file {}", handle.path.display());

        Ok((handle, Opened::Created))
    }

    /// Append a snapshot to an open record.
    ///
    /// A missing, empty or unparsable file is treated as lost: the record is
    /// rewritten with `snapshot` as its initial state.
    pub fn append(&self, handle: &RecordHandle, snapshot: &Snapshot) -> Result<Appended> {
        let now = Utc::now();
        let mut record = match load(&handle.path) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    target: "matchlog::store",
                    "Match file {} is unreadable ({}), recreating from current snapshot",
                    handle.path.display(),
                    e
                );
                let record = MatchRecord::new(handle.session_id.clone(), snapshot.clone(), now);
                write_record(&handle.path, &record)?;
                return Ok(Appended::Recreated);
            }
        };

        record.push_update(snapshot.clone(), now);
        write_record(&handle.path, &record)?;

        Ok(Appended::Appended {
            updates: record.updates.len(),
        })
    }

    /// Close a record. Consumes the handle: further writes need a new one.
    pub fn finalize(&self, handle: RecordHandle, final_snapshot: &Snapshot) -> Result<()> {
        let now = Utc::now();
        let mut record = load(&handle.path).unwrap_or_else(|e| {
            warn!(
                target: "matchlog::store",
                "Match file {} is unreadable ({}), finalizing from current snapshot",
                handle.path.display(),
                e
            );
            MatchRecord::new(handle.session_id.clone(), final_snapshot.clone(), now)
        });

        record.close(final_snapshot.clone(), now);
        write_record(&handle.path, &record)?;
        info!(target: "matchlog::store", "Finalized match file {}", handle.path.display());

        Ok(())
    }

    /// Most recently modified record in the newest date directory.
    pub fn latest_record_path(&self) -> Result<Option<PathBuf>> {
        let mut date_dirs = self.date_dirs()?;
        date_dirs.sort();

        for dir in date_dirs.iter().rev() {
            let newest = record_files(dir)?
                .into_iter()
                .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
            if let Some((_, path)) = newest {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    fn find_existing(&self, session_id: &SessionId) -> Result<Option<PathBuf>> {
        let prefix = format!("{}{}_", FILE_PREFIX, session_id);
        let mut newest: Option<(SystemTime, PathBuf)> = None;

        for dir in self.date_dirs()? {
            for (modified, path) in record_files(&dir)? {
                let matches = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(&prefix));
                if !matches {
                    continue;
                }
                let is_newer = newest
                    .as_ref()
                    .is_none_or(|(best, best_path)| (modified, &path) > (*best, best_path));
                if is_newer {
                    newest = Some((modified, path));
                }
            }
        }

        Ok(newest.map(|(_, path)| path))
    }

    fn new_record_path(&self, session_id: Option<&SessionId>) -> Result<PathBuf> {
        let now = Local::now();
        let dir = self.root.join(now.format("%Y-%m-%d").to_string());
        fs::create_dir_all(&dir).map_err(|e| MatchlogError::io(&dir, e))?;

        let stamp = now.format("%Y%m%d_%H%M%S_%3f").to_string();
        let stem = match session_id {
            Some(id) => format!("{}{}_{}", FILE_PREFIX, id, stamp),
            None => format!("{}{}", FILE_PREFIX, stamp),
        };

        let mut path = dir.join(format!("{}.{}", stem, FILE_EXTENSION));
        let mut suffix = 1;
        while path.exists() {
            path = dir.join(format!("{}_{}.{}", stem, suffix, FILE_EXTENSION));
            suffix += 1;
        }
        Ok(path)
    }

    fn date_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MatchlogError::io(&self.root, e)),
        };

        Ok(entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect())
    }
}

/// Read and parse a record file.
pub fn load(path: &Path) -> Result<MatchRecord> {
    let content = fs::read_to_string(path).map_err(|e| MatchlogError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

fn write_record(path: &Path, record: &MatchRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    let temp_path = temporary_path(path);

    fs::write(&temp_path, json).map_err(|e| MatchlogError::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| MatchlogError::io(path, e))?;
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// `match_*.json` files in one directory with their modification times.
fn record_files(dir: &Path) -> Result<Vec<(SystemTime, PathBuf)>> {
    let entries = fs::read_dir(dir).map_err(|e| MatchlogError::io(dir, e))?;
    let mut files = Vec::new();

    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        let is_record = path.extension().is_some_and(|ext| ext == FILE_EXTENSION)
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX));
        if !is_record {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((modified, path));
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn snapshot(clock: i64) -> Snapshot {
        normalize(&json!({
            "map": {
                "matchid": "111",
                "clock_time": clock,
                "game_state": "DOTA_GAMERULES_STATE_GAME_IN_PROGRESS"
            }
        }))
    }

    fn store() -> (MatchStore, TempDir) {
        let temp = TempDir::new().unwrap();
        (MatchStore::new(temp.path()), temp)
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn test_create_writes_initial_snapshot() {
        let (store, _temp) = store();
        let id = SessionId::new("111").unwrap();

        let (handle, opened) = store.start_or_resume(Some(&id), &snapshot(0), None).unwrap();
        assert_eq!(opened, Opened::Created);
        assert_eq!(handle.session_id(), Some(&id));

        let name = handle.path().file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("match_111_"));
        assert!(name.ends_with(".json"));

        let date_dir = handle.path().parent().unwrap().file_name().unwrap().to_str().unwrap();
        assert_eq!(date_dir, Local::now().format("%Y-%m-%d").to_string());

        let record = load(handle.path()).unwrap();
        assert_eq!(record.session_id, Some(id));
        assert_eq!(record.initial_snapshot, snapshot(0));
        assert_eq!(record.last_snapshot, snapshot(0));
        assert!(record.updates.is_empty());
        assert!(record.is_open());
    }

    #[test]
    fn test_append_then_reload() {
        let (store, _temp) = store();
        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();

        for clock in 1..=3 {
            let outcome = store.append(&handle, &snapshot(clock)).unwrap();
            assert_eq!(outcome, Appended::Appended { updates: clock as usize });
        }

        let record = load(handle.path()).unwrap();
        assert_eq!(record.updates.len(), 3);
        assert_eq!(record.last_snapshot, snapshot(3));
        assert_eq!(record.initial_snapshot, snapshot(0));
        assert!(record.updates.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(record.last_update_at, record.updates[2].timestamp);
        assert!(!temporary_path(handle.path()).exists());
    }

    #[test]
    fn test_append_recreates_corrupt_file() {
        let (store, _temp) = store();
        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();
        store.append(&handle, &snapshot(1)).unwrap();

        fs::write(handle.path(), r#"{"record_started_at": "2024-01-0"#).unwrap();

        let outcome = store.append(&handle, &snapshot(2)).unwrap();
        assert_eq!(outcome, Appended::Recreated);

        let record = load(handle.path()).unwrap();
        assert_eq!(record.initial_snapshot, snapshot(2));
        assert_eq!(record.last_snapshot, snapshot(2));
        assert!(record.updates.is_empty());
    }

    #[test]
    fn test_append_recreates_empty_or_missing_file() {
        let (store, _temp) = store();
        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();

        fs::write(handle.path(), "").unwrap();
        assert_eq!(store.append(&handle, &snapshot(1)).unwrap(), Appended::Recreated);

        fs::remove_file(handle.path()).unwrap();
        assert_eq!(store.append(&handle, &snapshot(2)).unwrap(), Appended::Recreated);
        assert_eq!(load(handle.path()).unwrap().initial_snapshot, snapshot(2));
    }

    #[test]
    fn test_resume_existing_match_file() {
        let (store, _temp) = store();
        let id = SessionId::new("111").unwrap();
        let other = SessionId::new("1110").unwrap();

        let (first, _) = store.start_or_resume(Some(&id), &snapshot(0), None).unwrap();
        let (longer, _) = store.start_or_resume(Some(&other), &snapshot(0), None).unwrap();
        set_mtime(longer.path(), SystemTime::now() + Duration::from_secs(60));

        let (resumed, opened) = store.start_or_resume(Some(&id), &snapshot(5), None).unwrap();
        assert_eq!(opened, Opened::Resumed);
        assert_eq!(resumed, first);

        // Resuming does not write the triggering snapshot.
        assert_eq!(load(resumed.path()).unwrap().initial_snapshot, snapshot(0));
    }

    #[test]
    fn test_resume_picks_newest_candidate() {
        let (store, temp) = store();
        let id = SessionId::new("111").unwrap();

        let (today, _) = store.start_or_resume(Some(&id), &snapshot(0), None).unwrap();

        let old_dir = temp.path().join("2000-01-01");
        fs::create_dir_all(&old_dir).unwrap();
        let old = old_dir.join("match_111_20000101_000000_000.json");
        fs::copy(today.path(), &old).unwrap();

        set_mtime(today.path(), SystemTime::now() - Duration::from_secs(3600));
        set_mtime(&old, SystemTime::now());

        let (resumed, opened) = store.start_or_resume(Some(&id), &snapshot(1), None).unwrap();
        assert_eq!(opened, Opened::Resumed);
        assert_eq!(resumed.path(), old.as_path());
    }

    #[test]
    fn test_reuse_tracked_handle() {
        let (store, _temp) = store();
        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();

        let (reused, opened) = store
            .start_or_resume(None, &snapshot(1), Some(handle.clone()))
            .unwrap();
        assert_eq!(opened, Opened::Reused);
        assert_eq!(reused, handle);

        fs::remove_file(handle.path()).unwrap();
        let (fresh, opened) = store
            .start_or_resume(None, &snapshot(2), Some(handle.clone()))
            .unwrap();
        assert_eq!(opened, Opened::Created);
        assert_eq!(load(fresh.path()).unwrap().initial_snapshot, snapshot(2));
    }

    #[test]
    fn test_unidentified_records_do_not_collide() {
        let (store, _temp) = store();
        let (a, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();
        let (b, _) = store.start_or_resume(None, &snapshot(1), None).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_finalize_stamps_end() {
        let (store, _temp) = store();
        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();
        store.append(&handle, &snapshot(1)).unwrap();

        let path = handle.path().to_path_buf();
        store.finalize(handle, &snapshot(2)).unwrap();

        let record = load(&path).unwrap();
        assert!(!record.is_open());
        assert_eq!(record.final_snapshot, Some(snapshot(2)));
        assert_eq!(record.updates.len(), 1);
    }

    #[test]
    fn test_finalize_corrupt_file() {
        let (store, _temp) = store();
        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();
        let path = handle.path().to_path_buf();
        fs::write(&path, "not json").unwrap();

        store.finalize(handle, &snapshot(9)).unwrap();
        let record = load(&path).unwrap();
        assert_eq!(record.initial_snapshot, snapshot(9));
        assert_eq!(record.final_snapshot, Some(snapshot(9)));
    }

    #[test]
    fn test_latest_record_path() {
        let (store, temp) = store();
        assert_eq!(store.latest_record_path().unwrap(), None);

        let old_dir = temp.path().join("2000-01-01");
        fs::create_dir_all(&old_dir).unwrap();
        fs::write(old_dir.join("match_20000101_000000_000.json"), "{}").unwrap();

        let (handle, _) = store.start_or_resume(None, &snapshot(0), None).unwrap();
        fs::write(handle.path().with_file_name("notes.txt"), "ignored").unwrap();

        assert_eq!(store.latest_record_path().unwrap().as_deref(), Some(handle.path()));
    }

    #[test]
    fn test_write_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let store = MatchStore::new(&blocker);
        let err = store.start_or_resume(None, &snapshot(0), None).unwrap_err();
        assert!(matches!(err, MatchlogError::Io { .. }));
    }
}
