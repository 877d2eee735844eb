//! Scoring core.
//!
//! This module contains:
//! - Session aggregation into (mean dwell, mean flight) signatures
//! - The anti-poisoning consistency gate run before enrollment
//! - Nearest-profile verification over all enrolled users

pub mod gate;
pub mod numeric;
pub mod signature;
pub mod verifier;

// Re-export commonly used types
pub use gate::{ConsistencyGate, Deviation, GateDecision, ProfileHistory};
pub use signature::{aggregate, SessionSignature};
pub use verifier::{
    InputStats, ProfileAggregate, RankedProfile, VerificationMatch, VerificationResult, Verifier,
};
