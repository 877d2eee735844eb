//! Anti-poisoning consistency gate.
//!
//! Before a training session is committed to a user's profile it is compared
//! with the profile's current signature. Once the profile holds enough
//! sessions, a session that strays too far on either axis is rejected so an
//! impostor (or a different keyboard) cannot drag the baseline away.

use crate::core::signature::SessionSignature;
use serde::{Deserialize, Serialize};

/// Default maximum per-axis deviation in milliseconds.
pub const DEFAULT_MAX_DEVIATION_MS: f64 = 60.0;

/// Profiles with this many sessions or fewer are not judged yet.
pub const DEFAULT_MIN_SAMPLE_COUNT: u64 = 2;

/// Stored profile statistics the gate compares against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHistory {
    pub avg_dwell: f64,
    pub avg_flight: f64,
    /// Number of sessions that contributed to the averages
    pub sample_count: u64,
}

impl ProfileHistory {
    pub fn signature(&self) -> SessionSignature {
        SessionSignature::new(self.avg_dwell, self.avg_flight)
    }
}

/// Absolute per-axis difference between a session and its profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deviation {
    pub dwell_diff: f64,
    pub flight_diff: f64,
}

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    Accept,
    Reject(Deviation),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

/// Per-axis threshold check against stored history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyGate {
    max_deviation_ms: f64,
    min_sample_count: u64,
}

impl Default for ConsistencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEVIATION_MS, DEFAULT_MIN_SAMPLE_COUNT)
    }
}

impl ConsistencyGate {
    pub fn new(max_deviation_ms: f64, min_sample_count: u64) -> Self {
        Self {
            max_deviation_ms,
            min_sample_count,
        }
    }

    pub fn max_deviation_ms(&self) -> f64 {
        self.max_deviation_ms
    }

    pub fn min_sample_count(&self) -> u64 {
        self.min_sample_count
    }

    /// Decide whether `current` may be added to the profile described by `history`.
    ///
    /// A missing history (first session) or one with at most
    /// `min_sample_count` sessions always accepts.
    pub fn check(&self, current: &SessionSignature, history: Option<&ProfileHistory>) -> GateDecision {
        let Some(history) = history else {
            return GateDecision::Accept;
        };

        if history.sample_count <= self.min_sample_count {
            return GateDecision::Accept;
        }

        let deviation = Deviation {
            dwell_diff: (current.avg_dwell - history.avg_dwell).abs(),
            flight_diff: (current.avg_flight - history.avg_flight).abs(),
        };

        if deviation.dwell_diff > self.max_deviation_ms
            || deviation.flight_diff > self.max_deviation_ms
        {
            GateDecision::Reject(deviation)
        } else {
            GateDecision::Accept
        }
    }
}
