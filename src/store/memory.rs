//! In-memory profile store.

use crate::core::gate::ProfileHistory;
use crate::core::verifier::ProfileAggregate;
use crate::error::BiometricsError;
use crate::keystroke::KeystrokeEvent;
use crate::store::{
    all_profiles, count_sessions, lock_poisoned, user_history, ProfileStore, StoredSession,
};
use std::sync::RwLock;

/// Profile store that keeps every session in memory.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    sessions: RwLock<Vec<StoredSession>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with sessions.
    pub fn with_sessions(sessions: Vec<StoredSession>) -> Self {
        Self {
            sessions: RwLock::new(sessions),
        }
    }

    /// Copy of every stored session, oldest first.
    pub fn sessions(&self) -> Result<Vec<StoredSession>, BiometricsError> {
        Ok(self.sessions.read().map_err(lock_poisoned)?.clone())
    }

    pub fn total_sessions(&self) -> Result<usize, BiometricsError> {
        Ok(self.sessions.read().map_err(lock_poisoned)?.len())
    }
}

impl ProfileStore for MemoryProfileStore {
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
        self.sessions
            .write()
            .map_err(lock_poisoned)?
            .push(session.clone());
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
    use crate::keystroke::KeystrokeRecorder;

    fn typed(dwell: i64, gap: i64, count: usize) -> Vec<KeystrokeEvent> {
        let mut recorder = KeystrokeRecorder::new();
        let mut t = 0;
        for _ in 0..count {
            recorder.record("a", "65", t, t + dwell);
            t += dwell + gap;
        }
        recorder.into_events()
    }

    #[test]
    fn test_append_and_aggregate() {
        let store = MemoryProfileStore::new();
        assert!(store.user_aggregate("ana").unwrap().is_none());

        let stored = store.append_session("ana", "hello", &typed(100, 50, 5)).unwrap();
        assert_eq!(stored.user_id, "ana");
        assert_eq!(stored.keystrokes.len(), 5);

        store.append_session("ana", "hello", &typed(120, 30, 5)).unwrap();

        let history = store.user_aggregate("ana").unwrap().unwrap();
        assert_eq!(history.sample_count, 2);
        assert_eq!(history.avg_dwell, 110.0);
        assert_eq!(history.avg_flight, 32.0);
        assert_eq!(store.session_count("ana").unwrap(), 2);
        assert_eq!(store.session_count("ben").unwrap(), 0);
    }

    #[test]
    fn test_profile_flight_includes_leading_zero() {
        let store = MemoryProfileStore::new();
        let mut recorder = KeystrokeRecorder::new();
        recorder.record("a", "65", 0, 100);
        recorder.record("b", "66", 140, 240);
        store.append_session("ana", "ab", recorder.events()).unwrap();

        let history = store.user_aggregate("ana").unwrap().unwrap();
        assert_eq!(history.avg_dwell, 100.0);
        assert_eq!(history.avg_flight, 20.0);
    }

    #[test]
    fn test_all_user_aggregates() {
        let store = MemoryProfileStore::new();
        store.append_session("ben", "hello", &typed(90, 40, 3)).unwrap();
        store.append_session("ana", "hello", &typed(110, 60, 3)).unwrap();

        let profiles = store.all_user_aggregates().unwrap();
        let users: Vec<&str> = profiles.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(users, vec!["ben", "ana"]);
        assert_eq!(profiles[1].avg_dwell, Some(110.0));
        assert_eq!(profiles[1].avg_flight, Some(40.0));
        assert_eq!(store.total_sessions().unwrap(), 2);
    }
}
