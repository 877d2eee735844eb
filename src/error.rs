//! Error types for keystroke biometrics.

use thiserror::Error;

/// Errors surfaced by enrollment, verification and the profile stores.
#[derive(Debug, Error)]
pub enum BiometricsError {
    /// Malformed input, rejected before any aggregation happens.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The session is well-formed but deviates too far from the stored profile.
    #[error(
        "Inconsistent typing pattern detected. Deviation: Dwell {dwell_diff:.1}ms, Flight {flight_diff:.1}ms. \
         This session differs significantly from your established profile. \
         Please try again or ensure you're typing on your usual keyboard."
    )]
    InconsistentPattern { dwell_diff: f64, flight_diff: f64 },

    #[error("Profile store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl BiometricsError {
    /// Whether the caller sent something it should fix (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BiometricsError::Validation(_) | BiometricsError::InconsistentPattern { .. }
        )
    }
}
