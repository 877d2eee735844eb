//! Profile store persisted as a single JSON document.
//!
//! The whole session list is rewritten after every append. A failed write
//! leaves both the file and the in-memory copy as they were.

use crate::core::gate::ProfileHistory;
use crate::core::verifier::ProfileAggregate;
use crate::error::BiometricsError;
use crate::keystroke::KeystrokeEvent;
use crate::store::{
    all_profiles, count_sessions, lock_poisoned, user_history, ProfileStore, StoredSession,
};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Profile store backed by a JSON file on disk.
#[derive(Debug)]
pub struct JsonFileProfileStore {
    path: PathBuf,
    sessions: RwLock<Vec<StoredSession>>,
}

impl JsonFileProfileStore {
    /// Open the store at `path`, loading existing sessions if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, BiometricsError> {
        let path = path.into();

        let sessions = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), sessions = sessions.len(), "Opened profile store");

        Ok(Self {
            path,
            sessions: RwLock::new(sessions),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, sessions: &[StoredSession]) -> Result<(), BiometricsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(sessions)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl ProfileStore for JsonFileProfileStore {
    fn user_aggregate(&self, user_id: &str) -> Result<Option<ProfileHistory>, BiometricsError> {
        let sessions = self.sessions.read().map_err(lock_poisoned)?;
        Ok(user_history(&sessions, user_id))
    }

    fn all_user_aggregates(&self) -> Result<Vec<ProfileAggregate>, BiometricsError> {
        let sessions = self.sessions.read().map_err(lock_poisoned)?;
        Ok(all_profiles(&sessions))
    }

    fn append_session(
        &self,
        user_id: &str,
        text: &str,
        keystrokes: &[KeystrokeEvent],
    ) -> Result<StoredSession, BiometricsError> {
        let session = StoredSession::new(user_id, text, keystrokes);
        let mut sessions = self.sessions.write().map_err(lock_poisoned)?;

        sessions.push(session.clone());
        if let Err(e) = self.write(&sessions) {
            sessions.pop();
            tracing::error!(path = %self.path.display(), "Failed to persist session: {}", e);
            return Err(e);
        }

        Ok(session)
    }

    fn session_count(&self, user_id: &str) -> Result<u64, BiometricsError> {
        let sessions = self.sessions.read().map_err(lock_poisoned)?;
        Ok(count_sessions(&sessions, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystroke::KeystrokeEvent;

    fn keystrokes() -> Vec<KeystrokeEvent> {
        vec![
            KeystrokeEvent::new("o", "79", 0, 100, None),
            KeystrokeEvent::new("k", "75", 150, 240, Some(100)),
        ]
    }

    #[test]
    fn test_sessions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        {
            let store = JsonFileProfileStore::open(&path).unwrap();
            store.append_session("ana", "ok", &keystrokes()).unwrap();
            store.append_session("ana", "ok", &keystrokes()).unwrap();
        }

        let reopened = JsonFileProfileStore::open(&path).unwrap();
        let history = reopened.user_aggregate("ana").unwrap().unwrap();
        assert_eq!(history.sample_count, 2);
        assert_eq!(history.avg_dwell, 95.0);
        assert_eq!(history.avg_flight, 25.0);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileProfileStore::open(dir.path().join("nested").join("profiles.json")).unwrap();
        assert!(store.all_user_aggregates().unwrap().is_empty());

        store.append_session("ben", "ok", &keystrokes()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonFileProfileStore::open(&path).unwrap_err();
        assert!(matches!(err, BiometricsError::Json(_)));
    }
}
