//! JSON-file backed adherence log store.
//!
//! The whole file is read and rewritten on every mutation. Mutations hold
//! the store lock across the full load-modify-save so two commands can never
//! interleave their writes. Reads never fail: a missing or corrupt file is
//! treated as an empty log.

use crate::error::PersistenceError;
use adherence_types::AdherenceLog;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct LogStore {
    path: PathBuf,
    lock: Mutex<()>,
}

/// Result of a mark/unmark: whether anything changed, plus the saved log.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub changed: bool,
    pub log: AdherenceLog,
}

pub fn is_completed_today(log: &AdherenceLog, user_id: &str, today: NaiveDate) -> bool {
    log.is_completed(user_id, today)
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the persisted log. Missing, unreadable or corrupt ⇒ empty.
    pub fn load(&self) -> AdherenceLog {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("[STORE] {} does not exist yet", self.path.display());
                return AdherenceLog::new();
            }
            Err(e) => {
                log::warn!("[STORE] Failed to read {}: {}", self.path.display(), e);
                return AdherenceLog::new();
            }
        };

        if content.trim().is_empty() {
            return AdherenceLog::new();
        }

        match AdherenceLog::from_json(&content) {
            Ok(log) => log,
            Err(e) => {
                log::warn!(
                    "[STORE] {} is corrupt ({}), starting from an empty log",
                    self.path.display(),
                    e
                );
                AdherenceLog::new()
            }
        }
    }

    /// Atomic write: serialize to a temp file, then rename into place.
    pub fn save(&self, log: &AdherenceLog) -> Result<(), PersistenceError> {
        let json = log.to_json_pretty()?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| self.write_error(source))?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "taken_log.json".to_string());
        let tmp_path = self.path.with_file_name(format!(".{}.tmp", file_name));

        std::fs::write(&tmp_path, json).map_err(|source| self.write_error(source))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| {
            let _ = std::fs::remove_file(&tmp_path);
            self.write_error(source)
        })?;

        Ok(())
    }

    /// A consistent copy of the log, never observed mid-write.
    pub fn snapshot(&self) -> AdherenceLog {
        let _guard = self.lock.lock();
        self.load()
    }

    /// Load, apply `f`, and save as one unit of work.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut AdherenceLog) -> R,
    ) -> Result<(R, AdherenceLog), PersistenceError> {
        let _guard = self.lock.lock();
        let mut log = self.load();
        let result = f(&mut log);
        self.save(&log)?;
        Ok((result, log))
    }

    pub fn mark_completed(
        &self,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<Mutation, PersistenceError> {
        let (changed, log) = self.update(|log| log.mark_completed(user_id, today))?;
        log::info!("[STORE] Marked {} as taken on {}", user_id, today);
        Ok(Mutation { changed, log })
    }

    pub fn unmark(&self, user_id: &str, today: NaiveDate) -> Result<Mutation, PersistenceError> {
        let (changed, log) = self.update(|log| log.unmark(user_id, today))?;
        if changed {
            log::info!("[STORE] Cleared {} for {}", today, user_id);
        }
        Ok(Mutation { changed, log })
    }

    fn write_error(&self, source: std::io::Error) -> PersistenceError {
        PersistenceError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> LogStore {
        LogStore::new(dir.path().join("taken_log.json"))
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), r#"{"42": ["2024-03-01"]}"#).unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut log = AdherenceLog::new();
        log.mark_completed("42", d(2024, 3, 1));

        store.save(&log).unwrap();
        assert_eq!(store.load(), log);
        assert!(!dir.path().join(".taken_log.json.tmp").exists());
    }

    #[test]
    fn test_save_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("data").join("taken_log.json"));
        store.save(&AdherenceLog::new()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_to_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let store = LogStore::new(blocker.join("taken_log.json"));

        assert!(matches!(
            store.save(&AdherenceLog::new()),
            Err(PersistenceError::Write { .. })
        ));
    }

    #[test]
    fn test_mark_and_unmark_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let today = d(2024, 3, 1);

        let first = store.mark_completed("42", today).unwrap();
        assert!(first.changed);
        assert!(is_completed_today(&store.load(), "42", today));

        let second = store.mark_completed("42", today).unwrap();
        assert!(!second.changed);
        assert_eq!(first.log, second.log);

        let cleared = store.unmark("42", today).unwrap();
        assert!(cleared.changed);
        assert!(!is_completed_today(&store.load(), "42", today));

        let again = store.unmark("42", today).unwrap();
        assert!(!again.changed);
    }

    #[test]
    fn test_mark_overwrites_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "garbage").unwrap();

        store.mark_completed("42", d(2024, 3, 1)).unwrap();
        let log = store.load();
        assert!(log.is_completed("42", d(2024, 3, 1)));
        assert_eq!(log.user_count(), 1);
    }
}
