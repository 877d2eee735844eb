//! Enrollment and verification orchestration.
//!
//! [`BiometricService`] ties a [`ProfileStore`] to the scoring core:
//!
//! ```text
//! enroll: validate → aggregate → fetch history → gate → append
//! verify: validate → aggregate → fetch all profiles → rank
//! ```
//!
//! Enrollment does not lock between fetching history and appending. Two
//! sessions for the same user enrolled concurrently are both judged against
//! the same baseline, and both may be committed.

use crate::audit::{create_shared_log, SharedAuditLog};
use crate::config::Config;
use crate::core::gate::{ConsistencyGate, GateDecision};
use crate::core::signature::aggregate;
use crate::core::verifier::{VerificationResult, Verifier};
use crate::error::BiometricsError;
use crate::keystroke::{validate_keystrokes, KeystrokeEvent};
use crate::store::ProfileStore;
use serde::{Deserialize, Serialize};

/// A typing session submitted for training or verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    /// User being enrolled, or the claimed identity when verifying
    pub user_id: String,
    /// The text that was typed
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    pub keystrokes: Vec<KeystrokeEvent>,
}

impl SessionRequest {
    pub fn new(
        user_id: impl Into<String>,
        text: impl Into<String>,
        keystrokes: Vec<KeystrokeEvent>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            started_at: None,
            keystrokes,
        }
    }

    /// Parse a request, reporting malformed payloads as validation errors.
    pub fn from_json(json: &str) -> Result<Self, BiometricsError> {
        serde_json::from_str(json)
            .map_err(|e| BiometricsError::Validation(format!("malformed session payload: {e}")))
    }
}

/// Confirmation of an enrolled session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReceipt {
    pub id: String,
    pub user_id: String,
    pub text: String,
    /// RFC3339 creation time
    pub created_at: String,
    pub keystrokes_count: usize,
}

/// Training progress for a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub session_count: u64,
}

/// Enrollment and verification over a profile store.
pub struct BiometricService<S> {
    store: S,
    gate: ConsistencyGate,
    verifier: Verifier,
    audit: SharedAuditLog,
}

impl<S: ProfileStore> BiometricService<S> {
    /// Create a service with default thresholds.
    pub fn new(store: S) -> Self {
        Self {
            store,
            gate: ConsistencyGate::default(),
            verifier: Verifier::default(),
            audit: create_shared_log(),
        }
    }

    /// Create a service using the thresholds from `config`.
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store)
            .with_gate(ConsistencyGate::from(&config.gate))
            .with_verifier(Verifier::from(&config.verifier))
    }

    pub fn with_gate(mut self, gate: ConsistencyGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_verifier(mut self, verifier: Verifier) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_audit_log(mut self, audit: SharedAuditLog) -> Self {
        self.audit = audit;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn audit(&self) -> &SharedAuditLog {
        &self.audit
    }

    /// Enroll a training session.
    ///
    /// Returns [`BiometricsError::InconsistentPattern`] when the gate rejects
    /// the session; nothing is written in that case.
    pub fn enroll(&self, request: &SessionRequest) -> Result<SessionReceipt, BiometricsError> {
        if request.user_id.trim().is_empty() {
            return Err(BiometricsError::Validation("userId must not be empty".to_string()));
        }
        validate_keystrokes(&request.keystrokes, true)?;

        let current = aggregate(&request.keystrokes);
        let history = self.store.user_aggregate(&request.user_id)?;

        if let GateDecision::Reject(deviation) = self.gate.check(&current, history.as_ref()) {
            self.audit.record_rejected();
            tracing::warn!(
                user_id = %request.user_id,
                dwell_diff = deviation.dwell_diff,
                flight_diff = deviation.flight_diff,
                "Rejected inconsistent training session"
            );
            return Err(BiometricsError::InconsistentPattern {
                dwell_diff: deviation.dwell_diff,
                flight_diff: deviation.flight_diff,
            });
        }

        let stored = self
            .store
            .append_session(&request.user_id, &request.text, &request.keystrokes)?;
        self.audit.record_enrolled();

        tracing::info!(
            user_id = %stored.user_id,
            session_id = %stored.id,
            keystrokes = stored.keystrokes.len(),
            avg_dwell = current.avg_dwell,
            avg_flight = current.avg_flight,
            "Enrolled training session"
        );

        Ok(SessionReceipt {
            id: stored.id,
            user_id: stored.user_id,
            text: stored.text,
            created_at: stored.created_at.to_rfc3339(),
            keystrokes_count: stored.keystrokes.len(),
        })
    }

    /// Verify a typing sample against every enrolled profile.
    ///
    /// With no enrolled profiles the result is simply unverified with an
    /// empty matrix.
    pub fn verify(&self, request: &SessionRequest) -> Result<VerificationResult, BiometricsError> {
        validate_keystrokes(&request.keystrokes, false)?;

        let input = aggregate(&request.keystrokes);
        let profiles = self.store.all_user_aggregates()?;
        let result = self.verifier.verify(&input, &request.user_id, &profiles);

        self.audit.record_verification(result.verified);
        tracing::debug!(
            claimed_user = %request.user_id,
            profiles = profiles.len(),
            best_match = result.best_match().map(|m| m.user_id.as_str()).unwrap_or("-"),
            verified = result.verified,
            "Verification ranked"
        );

        Ok(result)
    }

    /// Number of sessions enrolled for `user_id`.
    pub fn user_stats(&self, user_id: &str) -> Result<UserStats, BiometricsError> {
        Ok(UserStats {
            user_id: user_id.to_string(),
            session_count: self.store.session_count(user_id)?,
        })
    }
}
