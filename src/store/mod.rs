//! Profile storage.
//!
//! The scoring core only needs three things from persistence: a user's profile
//! aggregate with its session count, every user's profile aggregate, and a way
//! to append an accepted session. [`ProfileStore`] captures exactly that so the
//! gate and verifier stay independent of how sessions are kept.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileProfileStore;
pub use memory::MemoryProfileStore;

use crate::core::gate::ProfileHistory;
use crate::core::signature::profile_signature;
use crate::core::verifier::ProfileAggregate;
use crate::error::BiometricsError;
use crate::keystroke::KeystrokeEvent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A committed training session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub id: String,
    pub user_id: String,
    /// The text that was typed
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub keystrokes: Vec<KeystrokeEvent>,
}

impl StoredSession {
    pub fn new(user_id: &str, text: &str, keystrokes: &[KeystrokeEvent]) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            text: text.to_string(),
            created_at: Utc::now(),
            keystrokes: keystrokes.to_vec(),
        }
    }
}

/// Read/append access to per-user typing history.
pub trait ProfileStore: Send + Sync {
    /// Profile signature of one user over all their keystrokes, with the
    /// number of sessions behind it. `None` if the user has no keystrokes.
    fn user_aggregate(&self, user_id: &str) -> Result<Option<ProfileHistory>, BiometricsError>;

    /// Profile signatures of every user, in order of first enrollment.
    fn all_user_aggregates(&self) -> Result<Vec<ProfileAggregate>, BiometricsError>;

    /// Commit a session. Only called once the consistency gate accepted it.
    fn append_session(
        &self,
        user_id: &str,
        text: &str,
        keystrokes: &[KeystrokeEvent],
    ) -> Result<StoredSession, BiometricsError>;

    /// Number of sessions stored for a user.
    fn session_count(&self, user_id: &str) -> Result<u64, BiometricsError>;
}

impl<S: ProfileStore + ?Sized> ProfileStore for Arc<S> {
    fn user_aggregate(&self, user_id: &str) -> Result<Option<ProfileHistory>, BiometricsError> {
        (**self).user_aggregate(user_id)
    }

    fn all_user_aggregates(&self) -> Result<Vec<ProfileAggregate>, BiometricsError> {
        (**self).all_user_aggregates()
    }

    fn append_session(
        &self,
        user_id: &str,
        text: &str,
        keystrokes: &[KeystrokeEvent],
    ) -> Result<StoredSession, BiometricsError> {
        (**self).append_session(user_id, text, keystrokes)
    }

    fn session_count(&self, user_id: &str) -> Result<u64, BiometricsError> {
        (**self).session_count(user_id)
    }
}

/// Aggregate one user's sessions into their profile history.
pub(crate) fn user_history(sessions: &[StoredSession], user_id: &str) -> Option<ProfileHistory> {
    let owned: Vec<&StoredSession> = sessions.iter().filter(|s| s.user_id == user_id).collect();
    let signature = profile_signature(owned.iter().flat_map(|s| s.keystrokes.iter()))?;

    Some(ProfileHistory {
        avg_dwell: signature.avg_dwell,
        avg_flight: signature.avg_flight,
        sample_count: owned.len() as u64,
    })
}

/// Aggregate every user's sessions, keeping first-enrollment order.
pub(crate) fn all_profiles(sessions: &[StoredSession]) -> Vec<ProfileAggregate> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_user: HashMap<&str, Vec<&KeystrokeEvent>> = HashMap::new();

    for session in sessions {
        let keystrokes = by_user.entry(session.user_id.as_str()).or_insert_with(|| {
            order.push(session.user_id.as_str());
            Vec::new()
        });
        keystrokes.extend(session.keystrokes.iter());
    }

    order
        .into_iter()
        .map(|user_id| match profile_signature(by_user[user_id].iter().copied()) {
            Some(signature) => ProfileAggregate::new(
                user_id,
                Some(signature.avg_dwell),
                Some(signature.avg_flight),
            ),
            None => ProfileAggregate::new(user_id, None, None),
        })
        .collect()
}

pub(crate) fn count_sessions(sessions: &[StoredSession], user_id: &str) -> u64 {
    sessions.iter().filter(|s| s.user_id == user_id).count() as u64
}

pub(crate) fn lock_poisoned<T>(_: T) -> BiometricsError {
    BiometricsError::Store("profile store lock poisoned".to_string())
}
